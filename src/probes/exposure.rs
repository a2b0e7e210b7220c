use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::models::{CredentialTier, Endpoint, FindingKind};

use super::signatures::{exposure_classes, ExposureClass};
use super::{finding_with_severity, Probe, ProbeCx, ProbeOutcome};

/// Scans a representative response body for sensitive-data patterns. At
/// most one finding per pattern class per endpoint, at the class severity.
pub struct ExposureProbe {
    classes: Vec<ExposureClass>,
}

impl ExposureProbe {
    pub fn new() -> Self {
        Self {
            classes: exposure_classes(),
        }
    }

    pub fn matched_classes<'a>(&'a self, body: &str) -> Vec<&'a ExposureClass> {
        self.classes
            .iter()
            .filter(|class| class.patterns.iter().any(|p| p.is_match(body)))
            .collect()
    }
}

impl Default for ExposureProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for ExposureProbe {
    fn name(&self) -> &'static str {
        "data-exposure"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        let result = cx
            .adapter
            .send(endpoint, &ProbeRequest::for_tier(CredentialTier::Normal))
            .await;
        if result.is_transport_error() {
            return ProbeOutcome::Inconclusive("exposure sample request failed".to_string());
        }
        if result.body.is_empty() {
            return ProbeOutcome::clean();
        }

        let findings = self
            .matched_classes(&result.body)
            .into_iter()
            .map(|class| {
                finding_with_severity(
                    FindingKind::SensitiveDataExposure,
                    class.severity,
                    endpoint.id(),
                    format!("Response body contains {} patterns", class.label),
                )
            })
            .collect();
        ProbeOutcome::Findings(findings)
    }
}
