use chrono::Utc;

use talon::models::{
    DiscoverySource, Endpoint, Finding, FindingKind, HttpMethod, Inconclusive, Protocol,
    ScanSession, SessionNote,
};
use talon::risk::RiskBucket;
use talon::{HtmlExporter, JsonExporter, Report};

fn sample_session(truncated: bool) -> ScanSession {
    let users = Endpoint::new(
        Protocol::Rest,
        HttpMethod::Get,
        "/api/users",
        DiscoverySource::SpecDocument,
    );
    let graphql = Endpoint::new(
        Protocol::GraphQl,
        HttpMethod::Post,
        "/graphql",
        DiscoverySource::Introspection,
    );
    let findings = vec![
        Finding::high(FindingKind::MissingAuthentication, users.id(), "anonymous 200"),
        Finding::info(FindingKind::SchemaDisclosure, graphql.id(), "introspection enabled"),
    ];
    let inconclusive = vec![Inconclusive {
        probe: "sql-injection".to_string(),
        endpoint: users.id(),
        reason: "2 payload requests failed at the transport level".to_string(),
    }];
    ScanSession {
        target: "http://localhost:8080".to_string(),
        endpoints: vec![users, graphql],
        findings,
        inconclusive,
        notes: vec![SessionNote::new("discovery/soap", "no WSDL document found")],
        started_at: Utc::now(),
        completed_at: Utc::now(),
        truncated,
        overall_risk: RiskBucket::Medium,
    }
}

#[test]
fn findings_always_reference_session_endpoints() {
    let session = sample_session(false);
    assert!(session.findings_are_consistent());
}

#[test]
fn report_separates_findings_from_inconclusive() {
    let report = Report::from_session(sample_session(false));
    assert_eq!(report.findings.len(), 2);
    assert_eq!(report.inconclusive.len(), 1);
    assert_eq!(report.summary.high, 1);
    assert_eq!(report.summary.info, 1);
    assert_eq!(report.summary.total_endpoints, 2);
    assert_eq!(report.summary.vulnerable_endpoints, 1);
}

#[test]
fn json_export_round_trips() {
    let report = Report::from_session(sample_session(true));
    let path = std::env::temp_dir().join("talon-report-roundtrip.json");
    let path = path.to_str().unwrap();

    JsonExporter::export(&report, path).unwrap();
    let loaded = JsonExporter::load(path).unwrap();

    assert_eq!(loaded.target, "http://localhost:8080");
    assert!(loaded.truncated);
    assert_eq!(loaded.endpoints.len(), 2);
    assert_eq!(loaded.findings.len(), 2);
    assert_eq!(loaded.findings[0].weakness_id, "CWE-306");
    assert_eq!(loaded.inconclusive.len(), 1);
    assert_eq!(loaded.notes.len(), 1);

    std::fs::remove_file(path).ok();
}

#[test]
fn json_contract_field_names_are_stable() {
    let report = Report::from_session(sample_session(false));
    let value: serde_json::Value = serde_json::to_value(&report).unwrap();
    for field in [
        "target",
        "started_at",
        "completed_at",
        "truncated",
        "endpoints",
        "findings",
        "inconclusive",
        "notes",
        "summary",
    ] {
        assert!(value.get(field).is_some(), "missing report field: {}", field);
    }
    let finding = &value["findings"][0];
    for field in ["kind", "severity", "endpoint", "evidence", "cvss_score", "weakness_id", "recommendation"] {
        assert!(finding.get(field).is_some(), "missing finding field: {}", field);
    }
    let recs = value["summary"]["recommendations"]
        .as_array()
        .expect("summary.recommendations missing");
    assert!(!recs.is_empty());
    for field in ["kind", "max_severity", "weakness_id", "advice", "affected"] {
        assert!(recs[0].get(field).is_some(), "missing recommendation field: {}", field);
    }
}

#[test]
fn html_export_renders_findings_and_truncation_banner() {
    let report = Report::from_session(sample_session(true));
    let path = std::env::temp_dir().join("talon-report-render.html");
    let path = path.to_str().unwrap();

    HtmlExporter::export(&report, path).unwrap();
    let html = std::fs::read_to_string(path).unwrap();

    assert!(html.contains("Missing Authentication"));
    assert!(html.contains("CWE-306"));
    assert!(html.contains("http://localhost:8080"));
    assert!(html.contains("results are partial"));

    std::fs::remove_file(path).ok();
}

#[test]
fn loading_a_corrupt_report_fails_cleanly() {
    let path = std::env::temp_dir().join("talon-report-corrupt.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(JsonExporter::load(path.to_str().unwrap()).is_err());
    std::fs::remove_file(path).ok();
}
