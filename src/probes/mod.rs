pub mod payloads;
pub mod signatures;

mod auth;
mod cors;
mod dos;
mod exposure;
mod headers;
mod injection;
mod rate_limit;

pub use auth::{HorizontalEscalationProbe, MissingAuthProbe, VerticalEscalationProbe};
pub use cors::CorsProbe;
pub use dos::DosProbe;
pub use exposure::ExposureProbe;
pub use headers::HeaderAuditProbe;
pub use injection::InjectionProbe;
pub use rate_limit::RateLimitProbe;

use async_trait::async_trait;
use std::sync::Arc;

use crate::adapter::ProtocolAdapter;
use crate::config::ScanContext;
use crate::models::{Endpoint, EndpointId, Finding, FindingKind, Severity};

/// Result of one probe invocation. A transport failure inside a probe makes
/// the whole invocation inconclusive; probes never fabricate findings from
/// network noise.
#[derive(Debug)]
pub enum ProbeOutcome {
    Findings(Vec<Finding>),
    Inconclusive(String),
}

impl ProbeOutcome {
    pub fn clean() -> Self {
        ProbeOutcome::Findings(Vec::new())
    }

    pub fn one(finding: Finding) -> Self {
        ProbeOutcome::Findings(vec![finding])
    }
}

/// Everything a probe may read: session configuration, the protocol
/// adapter for its endpoint, and the endpoint's measured baseline latency.
pub struct ProbeCx<'a> {
    pub ctx: &'a ScanContext,
    pub adapter: &'a dyn ProtocolAdapter,
    /// Median response time in ms; `u64::MAX` when the endpoint never
    /// answered during baselining, which suppresses all timing verdicts.
    pub baseline_ms: u64,
}

impl ProbeCx<'_> {
    /// Timing probes must not fire on endpoints that are already slower
    /// than the threshold.
    pub fn timing_usable(&self) -> bool {
        self.baseline_ms < self.ctx.timing_threshold_ms
    }
}

/// One independent test for one vulnerability class.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome;
}

/// Build a finding at a severity decided by signature data rather than a
/// fixed constructor.
pub(crate) fn finding_with_severity(
    kind: FindingKind,
    severity: Severity,
    endpoint: EndpointId,
    evidence: String,
) -> Finding {
    match severity {
        Severity::Critical => Finding::critical(kind, endpoint, evidence),
        Severity::High => Finding::high(kind, endpoint, evidence),
        Severity::Medium => Finding::medium(kind, endpoint, evidence),
        Severity::Low => Finding::low(kind, endpoint, evidence),
        Severity::Info => Finding::info(kind, endpoint, evidence),
    }
}

/// The full probe registry, in scheduling order. Regex-backed probes
/// compile their signatures once here.
pub fn registry() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(MissingAuthProbe),
        Arc::new(HorizontalEscalationProbe),
        Arc::new(VerticalEscalationProbe::new()),
        Arc::new(InjectionProbe::sql()),
        Arc::new(InjectionProbe::command()),
        Arc::new(InjectionProbe::path_traversal()),
        Arc::new(InjectionProbe::xss()),
        Arc::new(InjectionProbe::xxe()),
        Arc::new(RateLimitProbe),
        Arc::new(HeaderAuditProbe),
        Arc::new(ExposureProbe::new()),
        Arc::new(CorsProbe),
        Arc::new(DosProbe),
    ]
}
