use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::http::ProbeResult;
use crate::models::{Endpoint, FindingKind, Severity};

use super::{finding_with_severity, Probe, ProbeCx, ProbeOutcome};

/// One expected security response header. Frame protection accepts either
/// X-Frame-Options or a CSP frame-ancestors directive. Every absence rates
/// at least Medium; missing HSTS on an encrypted target rates High.
struct HeaderCheck {
    label: &'static str,
    severity: Severity,
    https_only: bool,
    satisfied: fn(&ProbeResult) -> bool,
}

fn checklist() -> Vec<HeaderCheck> {
    vec![
        HeaderCheck {
            label: "X-Content-Type-Options: nosniff",
            severity: Severity::Medium,
            https_only: false,
            satisfied: |r| {
                r.header("x-content-type-options")
                    .map(|v| v.eq_ignore_ascii_case("nosniff"))
                    .unwrap_or(false)
            },
        },
        HeaderCheck {
            label: "frame protection (X-Frame-Options or CSP frame-ancestors)",
            severity: Severity::Medium,
            https_only: false,
            satisfied: |r| {
                r.has_header("x-frame-options")
                    || r.header("content-security-policy")
                        .map(|v| v.contains("frame-ancestors"))
                        .unwrap_or(false)
            },
        },
        HeaderCheck {
            label: "Content-Security-Policy",
            severity: Severity::Medium,
            https_only: false,
            satisfied: |r| r.has_header("content-security-policy"),
        },
        HeaderCheck {
            label: "Strict-Transport-Security",
            severity: Severity::High,
            https_only: true,
            satisfied: |r| r.has_header("strict-transport-security"),
        },
        HeaderCheck {
            label: "X-XSS-Protection",
            severity: Severity::Medium,
            https_only: false,
            satisfied: |r| r.has_header("x-xss-protection"),
        },
    ]
}

/// Evaluate the checklist against one response. HSTS applies only when the
/// target is served over HTTPS.
pub fn missing_headers(result: &ProbeResult, is_https: bool) -> Vec<(&'static str, Severity)> {
    checklist()
        .iter()
        .filter(|check| !(check.https_only && !is_https))
        .filter(|check| !(check.satisfied)(result))
        .map(|check| (check.label, check.severity))
        .collect()
}

/// Audits security response headers with a single request per endpoint.
pub struct HeaderAuditProbe;

#[async_trait]
impl Probe for HeaderAuditProbe {
    fn name(&self) -> &'static str {
        "security-headers"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        let result = cx.adapter.send(endpoint, &ProbeRequest::anonymous()).await;
        if result.is_transport_error() {
            return ProbeOutcome::Inconclusive("header audit request failed".to_string());
        }

        let findings = missing_headers(&result, cx.ctx.is_https())
            .into_iter()
            .map(|(label, severity)| {
                finding_with_severity(
                    FindingKind::MissingSecurityHeader,
                    severity,
                    endpoint.id(),
                    format!("Response is missing {}", label),
                )
            })
            .collect();
        ProbeOutcome::Findings(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(headers: Vec<(&str, &str)>) -> ProbeResult {
        ProbeResult {
            status: 200,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
            elapsed_ms: 10,
            error: None,
        }
    }

    #[test]
    fn test_bare_response_fails_every_check() {
        let missing = missing_headers(&response_with(vec![]), true);
        assert_eq!(missing.len(), 5);
    }

    #[test]
    fn test_hsts_skipped_over_plain_http() {
        let missing = missing_headers(&response_with(vec![]), false);
        assert_eq!(missing.len(), 4);
        assert!(!missing.iter().any(|(label, _)| label.contains("Strict-Transport")));
    }

    #[test]
    fn test_csp_frame_ancestors_satisfies_frame_protection() {
        let result = response_with(vec![(
            "content-security-policy",
            "default-src 'self'; frame-ancestors 'none'",
        )]);
        let missing = missing_headers(&result, false);
        assert!(!missing.iter().any(|(label, _)| label.contains("frame protection")));
        assert!(!missing.iter().any(|(label, _)| *label == "Content-Security-Policy"));
    }

    #[test]
    fn test_fully_hardened_response_is_clean() {
        let result = response_with(vec![
            ("X-Content-Type-Options", "nosniff"),
            ("X-Frame-Options", "DENY"),
            ("Content-Security-Policy", "default-src 'none'"),
            ("Strict-Transport-Security", "max-age=63072000"),
            ("X-XSS-Protection", "1; mode=block"),
        ]);
        assert!(missing_headers(&result, true).is_empty());
    }

    #[test]
    fn test_missing_hsts_is_high_severity() {
        let missing = missing_headers(&response_with(vec![]), true);
        let hsts = missing
            .iter()
            .find(|(label, _)| label.contains("Strict-Transport"))
            .unwrap();
        assert_eq!(hsts.1, Severity::High);
    }

    #[test]
    fn test_every_absence_rates_at_least_medium() {
        let missing = missing_headers(&response_with(vec![]), true);
        assert!(missing.iter().all(|(_, severity)| *severity >= Severity::Medium));
    }
}
