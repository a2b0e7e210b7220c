use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::{Endpoint, EndpointId, Finding};
use crate::risk::RiskBucket;

/// A probe run that could not produce a verdict, usually because of network
/// noise. Kept separate from findings so operators can tell confirmed
/// issues from probe failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inconclusive {
    pub probe: String,
    pub endpoint: EndpointId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionNote {
    pub source: String,
    pub message: String,
}

impl SessionNote {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Append-only log shared by concurrent probe workers. The single mutex per
/// list is the one synchronization point for findings in the session.
#[derive(Debug, Default)]
pub struct FindingLog {
    findings: Mutex<Vec<Finding>>,
    inconclusive: Mutex<Vec<Inconclusive>>,
    notes: Mutex<Vec<SessionNote>>,
}

impl FindingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_finding(&self, finding: Finding) {
        self.findings.lock().expect("finding log poisoned").push(finding);
    }

    pub fn extend_findings(&self, findings: Vec<Finding>) {
        if findings.is_empty() {
            return;
        }
        self.findings
            .lock()
            .expect("finding log poisoned")
            .extend(findings);
    }

    pub fn push_inconclusive(&self, entry: Inconclusive) {
        self.inconclusive
            .lock()
            .expect("finding log poisoned")
            .push(entry);
    }

    pub fn push_note(&self, note: SessionNote) {
        self.notes.lock().expect("finding log poisoned").push(note);
    }

    pub fn finding_count(&self) -> usize {
        self.findings.lock().expect("finding log poisoned").len()
    }

    /// Move everything out, leaving the log empty. Called once at session
    /// finalization, after the worker pool has drained or been cancelled.
    pub fn drain(&self) -> (Vec<Finding>, Vec<Inconclusive>, Vec<SessionNote>) {
        let findings = std::mem::take(&mut *self.findings.lock().expect("finding log poisoned"));
        let inconclusive =
            std::mem::take(&mut *self.inconclusive.lock().expect("finding log poisoned"));
        let notes = std::mem::take(&mut *self.notes.lock().expect("finding log poisoned"));
        (findings, inconclusive, notes)
    }
}

/// The finalized state of one assessment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    pub target: String,
    pub endpoints: Vec<Endpoint>,
    pub findings: Vec<Finding>,
    pub inconclusive: Vec<Inconclusive>,
    pub notes: Vec<SessionNote>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub truncated: bool,
    pub overall_risk: RiskBucket,
}

impl ScanSession {
    /// Referential invariant: every finding points at an endpoint present in
    /// this session's endpoint set.
    pub fn findings_are_consistent(&self) -> bool {
        self.findings
            .iter()
            .all(|f| self.endpoints.iter().any(|e| e.id() == f.endpoint))
    }

    pub fn vulnerable_endpoint_count(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|e| {
                let id = e.id();
                self.findings
                    .iter()
                    .any(|f| f.endpoint == id && f.severity > crate::models::Severity::Info)
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscoverySource, Finding, FindingKind, HttpMethod, Protocol};

    #[test]
    fn test_log_append_and_drain() {
        let log = FindingLog::new();
        let ep = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::CommonPath);
        log.push_finding(Finding::high(FindingKind::MissingAuthentication, ep.id(), "ev"));
        log.push_note(SessionNote::new("discovery", "spec not found"));
        let (findings, inconclusive, notes) = log.drain();
        assert_eq!(findings.len(), 1);
        assert!(inconclusive.is_empty());
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_preserved() {
        use std::sync::Arc;
        let log = Arc::new(FindingLog::new());
        let ep = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::CommonPath);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let log = Arc::clone(&log);
            let id = ep.id();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    log.push_finding(Finding::medium(
                        FindingKind::MissingSecurityHeader,
                        id.clone(),
                        "x-frame-options absent",
                    ));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.finding_count(), 400);
    }
}
