use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::errors::TransportError;
use crate::http::ProbeResult;
use crate::models::{CredentialTier, Endpoint, FindingKind, Protocol, Severity};

use super::{finding_with_severity, Probe, ProbeCx, ProbeOutcome};

/// Complexity stress per protocol: nested field selection for GraphQL,
/// entity expansion for SOAP, nested JSON for REST bodies. Findings cap at
/// HIGH since the probe demonstrates amplification, not outage.
pub struct DosProbe;

const NESTING_DEPTH: usize = 15;

/// `query { __schema { types { fields { type { ... } } } } }` nested until
/// the resolver either bounds depth or burns time.
pub fn nested_graphql_query(depth: usize) -> String {
    let mut inner = "name".to_string();
    for _ in 0..depth {
        inner = format!("fields {{ type {{ {} }} }}", inner);
    }
    format!("{{ \"query\": \"query {{ __schema {{ types {{ {} }} }} }}\" }}", inner)
}

pub fn nested_json(depth: usize) -> String {
    let mut body = "1".to_string();
    for _ in 0..depth {
        body = format!("{{\"a\":[{}]}}", body);
    }
    body
}

/// A bounded entity-expansion envelope. Five indirection levels is enough
/// to show whether the parser expands entities at all.
pub fn entity_expansion_envelope() -> String {
    concat!(
        "<?xml version=\"1.0\"?>",
        "<!DOCTYPE soapenv:Envelope [",
        "<!ENTITY a \"expand\">",
        "<!ENTITY b \"&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\">",
        "<!ENTITY c \"&b;&b;&b;&b;&b;&b;&b;&b;&b;&b;\">",
        "<!ENTITY d \"&c;&c;&c;&c;&c;&c;&c;&c;&c;&c;\">",
        "<!ENTITY e \"&d;&d;&d;&d;&d;&d;&d;&d;&d;&d;\">",
        "]>",
        "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">",
        "<soapenv:Body><Ping>&e;</Ping></soapenv:Body>",
        "</soapenv:Envelope>",
    )
    .to_string()
}

/// A timeout or threshold-crossing delay under a complexity payload is the
/// amplification signal; a plain 5xx shows the payload at least crashed a
/// handler.
pub fn dos_verdict(
    result: &ProbeResult,
    timing_usable: bool,
    timing_threshold_ms: u64,
) -> Option<(Severity, String)> {
    if matches!(result.error, Some(TransportError::Timeout(_))) && timing_usable {
        return Some((
            Severity::High,
            format!("Request timed out after {}ms under a complexity payload", result.elapsed_ms),
        ));
    }
    if result.is_transport_error() {
        return None;
    }
    if timing_usable && result.elapsed_ms >= timing_threshold_ms {
        return Some((
            Severity::High,
            format!("Response delayed to {}ms by a complexity payload", result.elapsed_ms),
        ));
    }
    if result.status >= 500 {
        return Some((
            Severity::Medium,
            format!("Complexity payload produced HTTP {}", result.status),
        ));
    }
    None
}

impl DosProbe {
    /// Service roots carry the stress payloads; per-operation endpoints are
    /// skipped so a large schema does not multiply the load.
    fn payload_for(endpoint: &Endpoint) -> Option<String> {
        match endpoint.protocol {
            Protocol::GraphQl if endpoint.path.starts_with('/') => {
                Some(nested_graphql_query(NESTING_DEPTH))
            }
            Protocol::Soap if endpoint.path.starts_with('/') => Some(entity_expansion_envelope()),
            Protocol::Rest if endpoint.method.requires_body() => Some(nested_json(NESTING_DEPTH)),
            _ => None,
        }
    }
}

#[async_trait]
impl Probe for DosProbe {
    fn name(&self) -> &'static str {
        "resource-exhaustion"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        let Some(payload) = Self::payload_for(endpoint) else {
            return ProbeOutcome::clean();
        };

        let request = ProbeRequest::for_tier(CredentialTier::Normal).with_body(payload);
        let result = cx.adapter.send(endpoint, &request).await;

        if result.is_transport_error()
            && !matches!(result.error, Some(TransportError::Timeout(_)))
        {
            return ProbeOutcome::Inconclusive("complexity request failed".to_string());
        }

        match dos_verdict(&result, cx.timing_usable(), cx.ctx.timing_threshold_ms) {
            Some((severity, evidence)) => ProbeOutcome::one(finding_with_severity(
                FindingKind::ResourceExhaustion,
                severity,
                endpoint.id(),
                evidence,
            )),
            None => ProbeOutcome::clean(),
        }
    }
}
