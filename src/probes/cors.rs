use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::models::{Endpoint, FindingKind, Severity};

use super::{finding_with_severity, Probe, ProbeCx, ProbeOutcome};

const PROBE_ORIGIN: &str = "https://evil.example";

/// Sends a request from a hostile origin and inspects the CORS answer.
pub struct CorsProbe;

/// Classify the allow-origin/allow-credentials pair for one foreign origin.
pub fn cors_verdict(
    allow_origin: Option<&str>,
    allow_credentials: bool,
    probe_origin: &str,
) -> Option<(Severity, String)> {
    let origin = allow_origin?;
    if origin == "*" && allow_credentials {
        return Some((
            Severity::High,
            "Wildcard Access-Control-Allow-Origin combined with Allow-Credentials".to_string(),
        ));
    }
    if origin == probe_origin && allow_credentials {
        return Some((
            Severity::High,
            format!("Arbitrary origin {} reflected with Allow-Credentials", probe_origin),
        ));
    }
    if origin == probe_origin {
        return Some((
            Severity::High,
            format!("Arbitrary origin {} reflected in Access-Control-Allow-Origin", probe_origin),
        ));
    }
    if origin == "*" {
        return Some((
            Severity::Low,
            "Wildcard Access-Control-Allow-Origin on an API endpoint".to_string(),
        ));
    }
    None
}

#[async_trait]
impl Probe for CorsProbe {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        let request = ProbeRequest::anonymous().with_header("Origin", PROBE_ORIGIN);
        let result = cx.adapter.send(endpoint, &request).await;
        if result.is_transport_error() {
            return ProbeOutcome::Inconclusive("cors request failed".to_string());
        }

        let allow_credentials = result
            .header("access-control-allow-credentials")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        match cors_verdict(
            result.header("access-control-allow-origin"),
            allow_credentials,
            PROBE_ORIGIN,
        ) {
            Some((severity, evidence)) => ProbeOutcome::one(finding_with_severity(
                FindingKind::CorsMisconfiguration,
                severity,
                endpoint.id(),
                evidence,
            )),
            None => ProbeOutcome::clean(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_with_credentials_is_high() {
        let verdict = cors_verdict(Some("*"), true, PROBE_ORIGIN).unwrap();
        assert_eq!(verdict.0, Severity::High);
    }

    #[test]
    fn test_reflected_origin_with_credentials_is_high() {
        let verdict = cors_verdict(Some(PROBE_ORIGIN), true, PROBE_ORIGIN).unwrap();
        assert_eq!(verdict.0, Severity::High);
    }

    #[test]
    fn test_reflected_origin_is_high_with_or_without_credentials() {
        let verdict = cors_verdict(Some(PROBE_ORIGIN), false, PROBE_ORIGIN).unwrap();
        assert_eq!(verdict.0, Severity::High);
    }

    #[test]
    fn test_pinned_origin_is_clean() {
        assert!(cors_verdict(Some("https://app.example.com"), true, PROBE_ORIGIN).is_none());
    }

    #[test]
    fn test_no_cors_headers_is_clean() {
        assert!(cors_verdict(None, false, PROBE_ORIGIN).is_none());
    }
}
