use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::errors::ScanError;
use crate::http::ProbeResult;
use crate::models::{
    CredentialTier, Endpoint, FindingKind, ParamLocation, Protocol, Severity,
};

use super::signatures::{
    command_signatures, path_traversal_signatures, sql_error_signatures, xxe_signatures,
    SignaturePattern,
};
use super::{finding_with_severity, Probe, ProbeCx, ProbeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionClass {
    Sql,
    Command,
    PathTraversal,
    Xss,
    Xxe,
}

/// One probe instance per payload class. Signatures compile once at
/// registry construction; the run loop stays allocation-light.
pub struct InjectionProbe {
    class: InjectionClass,
    name: &'static str,
    signatures: Vec<SignaturePattern>,
}

impl InjectionProbe {
    pub fn sql() -> Self {
        Self {
            class: InjectionClass::Sql,
            name: "sql-injection",
            signatures: sql_error_signatures(),
        }
    }

    pub fn command() -> Self {
        Self {
            class: InjectionClass::Command,
            name: "command-injection",
            signatures: command_signatures(),
        }
    }

    pub fn path_traversal() -> Self {
        Self {
            class: InjectionClass::PathTraversal,
            name: "path-traversal",
            signatures: path_traversal_signatures(),
        }
    }

    pub fn xss() -> Self {
        Self {
            class: InjectionClass::Xss,
            name: "reflected-xss",
            signatures: Vec::new(),
        }
    }

    pub fn xxe() -> Self {
        Self {
            class: InjectionClass::Xxe,
            name: "xxe",
            signatures: xxe_signatures(),
        }
    }

    fn payloads<'a>(&self, cx: &'a ProbeCx<'_>) -> &'a [String] {
        let set = &cx.ctx.payloads;
        match self.class {
            InjectionClass::Sql => &set.sql,
            InjectionClass::Command => &set.command,
            InjectionClass::PathTraversal => &set.path_traversal,
            InjectionClass::Xss => &set.xss,
            InjectionClass::Xxe => &set.xxe,
        }
    }

    /// XXE payloads replace the whole request body, which only makes sense
    /// where a body exists to replace.
    fn applies_to(&self, endpoint: &Endpoint) -> bool {
        match self.class {
            InjectionClass::Xxe => {
                endpoint.protocol == Protocol::Soap || endpoint.method.requires_body()
            }
            _ => true,
        }
    }
}

/// Decide what one response proves about one payload. Pure so the verdict
/// table is testable without a server.
pub fn injection_verdict(
    class: InjectionClass,
    payload: &str,
    result: &ProbeResult,
    signatures: &[SignaturePattern],
    timing_usable: bool,
    timing_threshold_ms: u64,
) -> Option<(FindingKind, Severity, String)> {
    if result.is_transport_error() {
        return None;
    }

    if let Some(sig) = signatures.iter().find(|s| s.matches(&result.body)) {
        return Some((
            sig.kind,
            sig.severity,
            format!("{} (payload: {})", sig.description, payload),
        ));
    }

    if class == InjectionClass::Xss && !payload.is_empty() && result.body.contains(payload) {
        return Some((
            FindingKind::ReflectedXss,
            Severity::High,
            format!("Payload reflected verbatim in the response body: {}", payload),
        ));
    }

    let is_timing_payload = payload.contains("SLEEP") || payload.contains("pg_sleep");
    if class == InjectionClass::Sql
        && is_timing_payload
        && timing_usable
        && result.elapsed_ms >= timing_threshold_ms
    {
        return Some((
            FindingKind::SqlInjection,
            Severity::Critical,
            format!(
                "Response delayed to {}ms by time-based payload: {}",
                result.elapsed_ms, payload
            ),
        ));
    }

    None
}

#[async_trait]
impl Probe for InjectionProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        if !self.applies_to(endpoint) {
            return ProbeOutcome::clean();
        }

        let payloads = self.payloads(cx);
        if payloads.is_empty() {
            return ProbeOutcome::Inconclusive(
                ScanError::Probe {
                    probe: self.name,
                    message: "no payloads configured for this class".to_string(),
                }
                .to_string(),
            );
        }
        let mut failed_requests = 0usize;

        if self.class == InjectionClass::Xxe {
            for payload in payloads {
                let request = ProbeRequest::for_tier(CredentialTier::Normal)
                    .with_header("Content-Type", "application/xml")
                    .with_body(payload.clone());
                let result = cx.adapter.send(endpoint, &request).await;
                if result.is_transport_error() {
                    failed_requests += 1;
                    continue;
                }
                if let Some((kind, severity, evidence)) = injection_verdict(
                    self.class,
                    payload,
                    &result,
                    &self.signatures,
                    cx.timing_usable(),
                    cx.ctx.timing_threshold_ms,
                ) {
                    return ProbeOutcome::one(finding_with_severity(
                        kind,
                        severity,
                        endpoint.id(),
                        evidence,
                    ));
                }
            }
        } else {
            let targets: Vec<_> = endpoint
                .parameters
                .iter()
                .filter(|p| p.location != ParamLocation::Header)
                .collect();
            for param in targets {
                for payload in payloads {
                    let request = ProbeRequest::for_tier(CredentialTier::Normal)
                        .with_param(&param.name, payload);
                    let result = cx.adapter.send(endpoint, &request).await;
                    if result.is_transport_error() {
                        failed_requests += 1;
                        continue;
                    }
                    // One finding per class per endpoint; the first confirmed
                    // payload ends the loop.
                    if let Some((kind, severity, evidence)) = injection_verdict(
                        self.class,
                        payload,
                        &result,
                        &self.signatures,
                        cx.timing_usable(),
                        cx.ctx.timing_threshold_ms,
                    ) {
                        return ProbeOutcome::one(finding_with_severity(
                            kind,
                            severity,
                            endpoint.id(),
                            format!("Parameter '{}': {}", param.name, evidence),
                        ));
                    }
                }
            }
        }

        if failed_requests > 0 {
            return ProbeOutcome::Inconclusive(format!(
                "{} payload requests failed at the transport level",
                failed_requests
            ));
        }
        ProbeOutcome::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;

    fn response(status: u16, body: &str, elapsed_ms: u64) -> ProbeResult {
        ProbeResult {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            elapsed_ms,
            error: None,
        }
    }

    #[test]
    fn test_sql_error_signature_confirms() {
        let sigs = sql_error_signatures();
        let result = response(500, "You have an error in your SQL syntax near ''", 30);
        let verdict = injection_verdict(InjectionClass::Sql, "'", &result, &sigs, true, 4500);
        let (kind, severity, _) = verdict.expect("signature should confirm");
        assert_eq!(kind, FindingKind::SqlInjection);
        assert_eq!(severity, Severity::Critical);
    }

    #[test]
    fn test_time_based_verdict_requires_usable_baseline() {
        let result = response(200, "[]", 5100);
        let payload = "' OR SLEEP(5)--";
        assert!(injection_verdict(InjectionClass::Sql, payload, &result, &[], true, 4500).is_some());
        assert!(injection_verdict(InjectionClass::Sql, payload, &result, &[], false, 4500).is_none());
    }

    #[test]
    fn test_time_based_verdict_ignores_fast_responses() {
        let result = response(200, "[]", 120);
        let payload = "' OR SLEEP(5)--";
        assert!(injection_verdict(InjectionClass::Sql, payload, &result, &[], true, 4500).is_none());
    }

    #[test]
    fn test_non_timing_payload_never_triggers_timing_verdict() {
        let result = response(200, "[]", 9000);
        assert!(injection_verdict(InjectionClass::Sql, "'", &result, &[], true, 4500).is_none());
    }

    #[test]
    fn test_xss_reflection_verdict() {
        let payload = "<script>alert(1)</script>";
        let reflected = response(200, "<html>q=<script>alert(1)</script></html>", 20);
        let encoded = response(200, "<html>q=&lt;script&gt;alert(1)&lt;/script&gt;</html>", 20);
        let verdict = injection_verdict(InjectionClass::Xss, payload, &reflected, &[], true, 4500);
        assert_eq!(verdict.unwrap().0, FindingKind::ReflectedXss);
        assert!(injection_verdict(InjectionClass::Xss, payload, &encoded, &[], true, 4500).is_none());
    }

    #[test]
    fn test_transport_error_yields_no_verdict() {
        let result = ProbeResult::failed(TransportError::Timeout(10_000), 10_000);
        let sigs = sql_error_signatures();
        assert!(injection_verdict(InjectionClass::Sql, "'", &result, &sigs, true, 4500).is_none());
    }

    #[test]
    fn test_xxe_applies_only_to_body_carriers() {
        use crate::models::{DiscoverySource, HttpMethod};
        let probe = InjectionProbe::xxe();
        let get = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::CommonPath);
        let post = Endpoint::new(Protocol::Rest, HttpMethod::Post, "/api/users", DiscoverySource::CommonPath);
        let soap = Endpoint::new(Protocol::Soap, HttpMethod::Post, "GetUser", DiscoverySource::Wsdl);
        assert!(!probe.applies_to(&get));
        assert!(probe.applies_to(&post));
        assert!(probe.applies_to(&soap));
    }
}
