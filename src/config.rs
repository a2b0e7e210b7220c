use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::Credentials;
use crate::probes::payloads::PayloadSet;

/// Which protocol surfaces a session should discover and probe.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolSelection {
    pub rest: bool,
    pub graphql: bool,
    pub soap: bool,
}

impl Default for ProtocolSelection {
    fn default() -> Self {
        Self {
            rest: true,
            graphql: true,
            soap: true,
        }
    }
}

impl ProtocolSelection {
    /// Parse a comma-separated list like `rest,graphql`.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let mut selection = Self {
            rest: false,
            graphql: false,
            soap: false,
        };
        for part in input.split(',') {
            match part.trim().to_lowercase().as_str() {
                "rest" => selection.rest = true,
                "graphql" => selection.graphql = true,
                "soap" => selection.soap = true,
                "" => {}
                other => anyhow::bail!("Unknown protocol '{}'. Supported: rest, graphql, soap", other),
            }
        }
        if !selection.rest && !selection.graphql && !selection.soap {
            anyhow::bail!("No protocols selected");
        }
        Ok(selection)
    }
}

/// Session-wide configuration and shared state. Owned by the orchestrator
/// for the session's lifetime; read-only to probes.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub base_url: String,
    pub credentials: Credentials,
    /// Paths declared public by the operator; missing-auth findings are
    /// suppressed for them.
    pub public_paths: Vec<String>,
    pub concurrency: usize,
    pub session_timeout: Duration,
    pub request_timeout: Duration,
    /// Elapsed time above which a time-based probe counts a response as
    /// delayed, provided the endpoint's baseline is below it.
    pub timing_threshold_ms: u64,
    pub rate_limit_burst: usize,
    pub baseline_samples: usize,
    pub payloads: PayloadSet,
    pub graphql_path: String,
    pub soap_path: String,
    pub cancel: CancellationToken,
}

impl ScanContext {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Credentials::default(),
            public_paths: Vec::new(),
            concurrency: 8,
            session_timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(10),
            timing_threshold_ms: 4500,
            rate_limit_burst: 20,
            baseline_samples: 3,
            payloads: PayloadSet::default(),
            graphql_path: "/graphql".to_string(),
            soap_path: "/soap".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn graphql_url(&self) -> String {
        self.url_for(&self.graphql_path)
    }

    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_selection_parse() {
        let sel = ProtocolSelection::parse("rest,graphql").unwrap();
        assert!(sel.rest);
        assert!(sel.graphql);
        assert!(!sel.soap);
    }

    #[test]
    fn test_protocol_selection_rejects_unknown() {
        assert!(ProtocolSelection::parse("grpc").is_err());
        assert!(ProtocolSelection::parse("").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ctx = ScanContext::new("https://api.example.com/");
        assert_eq!(ctx.url_for("/api/users"), "https://api.example.com/api/users");
        assert!(ctx.is_https());
    }

    #[test]
    fn test_public_path_matching() {
        let mut ctx = ScanContext::new("http://localhost");
        ctx.public_paths = vec!["/health".to_string()];
        assert!(ctx.is_public_path("/api/health"));
        assert!(!ctx.is_public_path("/api/users"));
    }
}
