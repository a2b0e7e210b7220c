use talon::models::{DiscoverySource, Endpoint, Finding, FindingKind, HttpMethod, Protocol};
use talon::risk::{endpoint_score, mean_score, recommendations, RiskBucket, ScanSummary};
use talon::Severity;

fn endpoint(path: &str) -> Endpoint {
    Endpoint::new(Protocol::Rest, HttpMethod::Get, path, DiscoverySource::CommonPath)
}

#[test]
fn single_critical_on_a_small_surface_is_critical_overall() {
    let ep = endpoint("/api/users");
    let findings = vec![
        Finding::critical(FindingKind::SqlInjection, ep.id(), "error signature"),
        Finding::high(FindingKind::MissingAuthentication, ep.id(), "anonymous 200"),
    ];
    let endpoints = vec![ep];
    let mean = mean_score(&endpoints, &findings);
    assert_eq!(RiskBucket::from_mean_score(mean), RiskBucket::Critical);
}

#[test]
fn wide_clean_surface_dilutes_one_broken_endpoint() {
    let broken = endpoint("/api/legacy");
    let mut endpoints = vec![broken.clone()];
    for i in 0..19 {
        endpoints.push(endpoint(&format!("/api/clean/{}", i)));
    }
    let findings = vec![Finding::critical(FindingKind::SqlInjection, broken.id(), "ev")];

    assert_eq!(endpoint_score(&broken.id(), &findings), 30);
    let mean = mean_score(&endpoints, &findings);
    assert_eq!(RiskBucket::from_mean_score(mean), RiskBucket::Low);
}

#[test]
fn endpoint_score_is_capped() {
    let ep = endpoint("/api/disaster");
    let findings: Vec<Finding> = vec![
        Finding::critical(FindingKind::SqlInjection, ep.id(), "ev"),
        Finding::critical(FindingKind::CommandInjection, ep.id(), "ev"),
        Finding::critical(FindingKind::XmlExternalEntity, ep.id(), "ev"),
        Finding::critical(FindingKind::VerticalPrivilegeEscalation, ep.id(), "ev"),
    ];
    assert_eq!(endpoint_score(&ep.id(), &findings), 100);
}

#[test]
fn info_only_session_is_secure() {
    let ep = endpoint("/graphql");
    let findings = vec![Finding::info(
        FindingKind::SchemaDisclosure,
        ep.id(),
        "introspection enabled",
    )];
    let endpoints = vec![ep];
    assert_eq!(
        RiskBucket::from_mean_score(mean_score(&endpoints, &findings)),
        RiskBucket::Secure
    );

    let summary = ScanSummary::build(&endpoints, &findings);
    assert_eq!(summary.info, 1);
    assert_eq!(summary.vulnerable_endpoints, 0);
    assert_eq!(summary.total_findings(), 1);
}

#[test]
fn severity_and_cvss_never_drift() {
    let ep = endpoint("/api/users");
    let finding = Finding::critical(FindingKind::SqlInjection, ep.id(), "ev");
    assert_eq!(finding.severity, Severity::Critical);
    assert!((finding.cvss_score - 9.8).abs() < f64::EPSILON);
    assert_eq!(finding.weakness_id, "CWE-89");
    assert!(!finding.recommendation.is_empty());
}

#[test]
fn recommendations_are_one_block_per_class_worst_first() {
    let a = endpoint("/api/users");
    let b = endpoint("/api/orders");
    let findings = vec![
        Finding::medium(FindingKind::MissingRateLimit, a.id(), "ev"),
        Finding::critical(FindingKind::SqlInjection, a.id(), "ev"),
        Finding::critical(FindingKind::SqlInjection, b.id(), "ev"),
        Finding::low(FindingKind::MissingSecurityHeader, b.id(), "ev"),
    ];
    let recs = recommendations(&findings);
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].kind, FindingKind::SqlInjection);
    assert_eq!(recs[0].affected.len(), 2);
    assert!(recs
        .windows(2)
        .all(|pair| pair[0].max_severity >= pair[1].max_severity));

    // The summary carries the same blocks into the exported report.
    let summary = ScanSummary::build(&[a, b], &findings);
    assert_eq!(summary.recommendations.len(), 3);
    assert_eq!(summary.recommendations[0].kind, FindingKind::SqlInjection);
}
