use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::models::{Endpoint, EndpointId, Finding, FindingKind, Severity};

/// Overall posture bucket for a session. Derived from the mean endpoint
/// risk score, never stored per finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    Critical,
    High,
    Medium,
    Low,
    Secure,
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskBucket::Critical => "CRITICAL",
            RiskBucket::High => "HIGH",
            RiskBucket::Medium => "MEDIUM",
            RiskBucket::Low => "LOW",
            RiskBucket::Secure => "SECURE",
        };
        write!(f, "{}", s)
    }
}

impl RiskBucket {
    pub fn from_mean_score(mean: f64) -> Self {
        if mean >= 50.0 {
            RiskBucket::Critical
        } else if mean >= 30.0 {
            RiskBucket::High
        } else if mean >= 15.0 {
            RiskBucket::Medium
        } else if mean > 0.0 {
            RiskBucket::Low
        } else {
            RiskBucket::Secure
        }
    }
}

/// Sum of per-finding weights for one endpoint, capped at 100 so a single
/// badly broken endpoint cannot dominate the mean unboundedly.
pub fn endpoint_score(endpoint: &EndpointId, findings: &[Finding]) -> u32 {
    let total: u32 = findings
        .iter()
        .filter(|f| &f.endpoint == endpoint)
        .map(|f| f.kind.risk_weight(f.severity))
        .sum();
    total.min(100)
}

/// Mean endpoint score across every discovered endpoint, clean ones
/// included. A session with no endpoints scores zero.
pub fn mean_score(endpoints: &[Endpoint], findings: &[Finding]) -> f64 {
    if endpoints.is_empty() {
        return 0.0;
    }
    let total: u32 = endpoints
        .iter()
        .map(|e| endpoint_score(&e.id(), findings))
        .sum();
    f64::from(total) / endpoints.len() as f64
}

/// Aggregated counts plus the session's remediation guidance. Part of the
/// exported JSON contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_endpoints: usize,
    pub vulnerable_endpoints: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub mean_risk_score: f64,
    pub overall_risk: RiskBucket,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl ScanSummary {
    pub fn build(endpoints: &[Endpoint], findings: &[Finding]) -> Self {
        let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();
        let mean = mean_score(endpoints, findings);
        let vulnerable = endpoints
            .iter()
            .filter(|e| {
                let id = e.id();
                findings
                    .iter()
                    .any(|f| f.endpoint == id && f.severity > Severity::Info)
            })
            .count();
        Self {
            total_endpoints: endpoints.len(),
            vulnerable_endpoints: vulnerable,
            critical: count(Severity::Critical),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
            info: count(Severity::Info),
            mean_risk_score: (mean * 10.0).round() / 10.0,
            overall_risk: RiskBucket::from_mean_score(mean),
            recommendations: recommendations(findings),
        }
    }

    pub fn total_findings(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// One remediation block per vulnerability class, covering every endpoint
/// the class was found on. Ordered worst-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: FindingKind,
    pub max_severity: Severity,
    pub weakness_id: String,
    pub advice: String,
    pub affected: Vec<EndpointId>,
}

pub fn recommendations(findings: &[Finding]) -> Vec<Recommendation> {
    let mut by_kind: HashMap<FindingKind, Recommendation> = HashMap::new();
    for finding in findings {
        let entry = by_kind.entry(finding.kind).or_insert_with(|| Recommendation {
            kind: finding.kind,
            max_severity: finding.severity,
            weakness_id: finding.weakness_id.clone(),
            advice: finding.recommendation.clone(),
            affected: Vec::new(),
        });
        if finding.severity > entry.max_severity {
            entry.max_severity = finding.severity;
        }
        if !entry.affected.contains(&finding.endpoint) {
            entry.affected.push(finding.endpoint.clone());
        }
    }
    let mut list: Vec<Recommendation> = by_kind.into_values().collect();
    list.sort_by(|a, b| {
        b.max_severity
            .cmp(&a.max_severity)
            .then_with(|| a.kind.cmp(&b.kind))
    });
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscoverySource, HttpMethod, Protocol};

    fn endpoint(path: &str) -> Endpoint {
        Endpoint::new(Protocol::Rest, HttpMethod::Get, path, DiscoverySource::CommonPath)
    }

    #[test]
    fn test_endpoint_score_caps_at_100() {
        let ep = endpoint("/api/users");
        let findings: Vec<Finding> = (0..6)
            .map(|_| Finding::critical(FindingKind::SqlInjection, ep.id(), "ev"))
            .collect();
        assert_eq!(endpoint_score(&ep.id(), &findings), 100);
    }

    #[test]
    fn test_clean_endpoints_pull_the_mean_down() {
        let broken = endpoint("/api/users");
        let clean: Vec<Endpoint> = (1..=9)
            .map(|i| endpoint(&format!("/api/clean{}", i)))
            .collect();
        let mut endpoints = vec![broken.clone()];
        endpoints.extend(clean);
        let findings = vec![Finding::critical(FindingKind::SqlInjection, broken.id(), "ev")];
        let mean = mean_score(&endpoints, &findings);
        assert!((mean - 3.0).abs() < f64::EPSILON);
        assert_eq!(RiskBucket::from_mean_score(mean), RiskBucket::Low);
    }

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(RiskBucket::from_mean_score(55.0), RiskBucket::Critical);
        assert_eq!(RiskBucket::from_mean_score(50.0), RiskBucket::Critical);
        assert_eq!(RiskBucket::from_mean_score(35.0), RiskBucket::High);
        assert_eq!(RiskBucket::from_mean_score(20.0), RiskBucket::Medium);
        assert_eq!(RiskBucket::from_mean_score(0.5), RiskBucket::Low);
        assert_eq!(RiskBucket::from_mean_score(0.0), RiskBucket::Secure);
    }

    #[test]
    fn test_empty_session_is_secure() {
        assert_eq!(RiskBucket::from_mean_score(mean_score(&[], &[])), RiskBucket::Secure);
    }

    #[test]
    fn test_info_findings_do_not_raise_risk() {
        let ep = endpoint("/graphql");
        let findings = vec![Finding::info(FindingKind::SchemaDisclosure, ep.id(), "introspection on")];
        assert_eq!(endpoint_score(&ep.id(), &findings), 0);
        let summary = ScanSummary::build(std::slice::from_ref(&ep), &findings);
        assert_eq!(summary.overall_risk, RiskBucket::Secure);
        assert_eq!(summary.vulnerable_endpoints, 0);
        assert_eq!(summary.info, 1);
    }

    #[test]
    fn test_recommendations_group_by_kind() {
        let a = endpoint("/api/users");
        let b = endpoint("/api/orders");
        let findings = vec![
            Finding::critical(FindingKind::SqlInjection, a.id(), "ev"),
            Finding::critical(FindingKind::SqlInjection, b.id(), "ev"),
            Finding::medium(FindingKind::MissingRateLimit, a.id(), "ev"),
        ];
        let recs = recommendations(&findings);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, FindingKind::SqlInjection);
        assert_eq!(recs[0].affected.len(), 2);
        assert_eq!(recs[1].kind, FindingKind::MissingRateLimit);
    }
}
