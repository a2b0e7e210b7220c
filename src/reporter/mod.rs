mod console;
mod export;

pub use console::ConsoleReporter;
pub use export::{HtmlExporter, JsonExporter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Endpoint, Finding, Inconclusive, ScanSession, SessionNote};
use crate::risk::ScanSummary;

/// The machine-readable assessment document. Field names are the external
/// contract; changing them breaks downstream consumers of exported files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub truncated: bool,
    pub endpoints: Vec<Endpoint>,
    pub findings: Vec<Finding>,
    pub inconclusive: Vec<Inconclusive>,
    pub notes: Vec<SessionNote>,
    pub summary: ScanSummary,
}

impl Report {
    pub fn from_session(session: ScanSession) -> Self {
        let summary = ScanSummary::build(&session.endpoints, &session.findings);
        Self {
            target: session.target,
            started_at: session.started_at,
            completed_at: session.completed_at,
            truncated: session.truncated,
            endpoints: session.endpoints,
            findings: session.findings,
            inconclusive: session.inconclusive,
            notes: session.notes,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscoverySource, Finding, FindingKind, HttpMethod, Protocol};
    use crate::risk::RiskBucket;

    fn session() -> ScanSession {
        let ep = Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api/users",
            DiscoverySource::CommonPath,
        );
        let findings = vec![Finding::high(
            FindingKind::MissingAuthentication,
            ep.id(),
            "anonymous 200",
        )];
        ScanSession {
            target: "http://localhost".to_string(),
            endpoints: vec![ep],
            findings,
            inconclusive: Vec::new(),
            notes: Vec::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            truncated: false,
            overall_risk: RiskBucket::Medium,
        }
    }

    #[test]
    fn test_report_carries_summary() {
        let report = Report::from_session(session());
        assert_eq!(report.summary.total_endpoints, 1);
        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.vulnerable_endpoints, 1);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = Report::from_session(session());
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target, report.target);
        assert_eq!(back.findings.len(), 1);
        assert_eq!(back.findings[0].weakness_id, "CWE-306");
    }
}
