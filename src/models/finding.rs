use serde::{Deserialize, Serialize};
use std::fmt;

use super::EndpointId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn numeric_value(&self) -> u8 {
        match self {
            Severity::Critical => 5,
            Severity::High => 4,
            Severity::Medium => 3,
            Severity::Low => 2,
            Severity::Info => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

/// The fixed taxonomy of vulnerability classes the engine tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingKind {
    MissingAuthentication,
    HorizontalPrivilegeEscalation,
    VerticalPrivilegeEscalation,
    SqlInjection,
    CommandInjection,
    PathTraversal,
    XmlExternalEntity,
    ReflectedXss,
    MissingRateLimit,
    MissingSecurityHeader,
    SensitiveDataExposure,
    CorsMisconfiguration,
    ResourceExhaustion,
    SchemaDisclosure,
    MissingWsSecurity,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FindingKind::MissingAuthentication => "Missing Authentication",
            FindingKind::HorizontalPrivilegeEscalation => "Horizontal Privilege Escalation",
            FindingKind::VerticalPrivilegeEscalation => "Vertical Privilege Escalation",
            FindingKind::SqlInjection => "SQL Injection",
            FindingKind::CommandInjection => "Command Injection",
            FindingKind::PathTraversal => "Path Traversal",
            FindingKind::XmlExternalEntity => "XML External Entity",
            FindingKind::ReflectedXss => "Reflected XSS",
            FindingKind::MissingRateLimit => "Missing Rate Limiting",
            FindingKind::MissingSecurityHeader => "Missing Security Header",
            FindingKind::SensitiveDataExposure => "Sensitive Data Exposure",
            FindingKind::CorsMisconfiguration => "CORS Misconfiguration",
            FindingKind::ResourceExhaustion => "Resource Exhaustion",
            FindingKind::SchemaDisclosure => "Schema Disclosure",
            FindingKind::MissingWsSecurity => "Missing WS-Security Policy",
        };
        write!(f, "{}", s)
    }
}

impl FindingKind {
    pub fn weakness_id(&self) -> &'static str {
        match self {
            FindingKind::MissingAuthentication => "CWE-306",
            FindingKind::HorizontalPrivilegeEscalation => "CWE-639",
            FindingKind::VerticalPrivilegeEscalation => "CWE-269",
            FindingKind::SqlInjection => "CWE-89",
            FindingKind::CommandInjection => "CWE-78",
            FindingKind::PathTraversal => "CWE-22",
            FindingKind::XmlExternalEntity => "CWE-611",
            FindingKind::ReflectedXss => "CWE-79",
            FindingKind::MissingRateLimit => "CWE-770",
            FindingKind::MissingSecurityHeader => "CWE-693",
            FindingKind::SensitiveDataExposure => "CWE-200",
            FindingKind::CorsMisconfiguration => "CWE-942",
            FindingKind::ResourceExhaustion => "CWE-400",
            FindingKind::SchemaDisclosure => "CWE-200",
            FindingKind::MissingWsSecurity => "CWE-345",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            FindingKind::MissingAuthentication => {
                "Require a valid authentication token for this endpoint"
            }
            FindingKind::HorizontalPrivilegeEscalation => {
                "Check resource ownership before granting access to object identifiers"
            }
            FindingKind::VerticalPrivilegeEscalation => {
                "Verify the caller's role matches the required permission level for administrative operations"
            }
            FindingKind::SqlInjection => {
                "Use parameterized queries; never interpolate user input into SQL"
            }
            FindingKind::CommandInjection => {
                "Avoid shelling out with user input; use safe process APIs with argument arrays"
            }
            FindingKind::PathTraversal => {
                "Canonicalize file paths and reject any path escaping the served root"
            }
            FindingKind::XmlExternalEntity => {
                "Disable DTD processing and external entity resolution in the XML parser"
            }
            FindingKind::ReflectedXss => {
                "Encode output for the response context and set a restrictive Content-Security-Policy"
            }
            FindingKind::MissingRateLimit => {
                "Enforce per-client rate limits and answer excess traffic with 429"
            }
            FindingKind::MissingSecurityHeader => {
                "Send the standard security response headers on every API response"
            }
            FindingKind::SensitiveDataExposure => {
                "Filter response payloads; never return credentials, personal data or debug detail"
            }
            FindingKind::CorsMisconfiguration => {
                "Allow only an explicit origin allow-list; never combine wildcard origins with credentials"
            }
            FindingKind::ResourceExhaustion => {
                "Bound request complexity (query depth, entity expansion, payload size) before processing"
            }
            FindingKind::SchemaDisclosure => {
                "Disable schema introspection in production deployments"
            }
            FindingKind::MissingWsSecurity => {
                "Attach a WS-Security policy to the service and require signed/encrypted messages"
            }
        }
    }

    /// Per-class contribution to an endpoint's risk score, banded by
    /// severity (CRITICAL 25-30, HIGH 15-20, MEDIUM 5-10, LOW 1-2) and
    /// tuned up for the classes with direct exploitation impact.
    pub fn risk_weight(&self, severity: Severity) -> u32 {
        let base = match severity {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 5,
            Severity::Low => 1,
            Severity::Info => return 0,
        };
        let tuning = match self {
            FindingKind::SqlInjection
            | FindingKind::CommandInjection
            | FindingKind::XmlExternalEntity
            | FindingKind::MissingAuthentication => 5,
            FindingKind::VerticalPrivilegeEscalation
            | FindingKind::HorizontalPrivilegeEscalation => 4,
            FindingKind::ReflectedXss
            | FindingKind::PathTraversal
            | FindingKind::SensitiveDataExposure
            | FindingKind::CorsMisconfiguration => 3,
            FindingKind::ResourceExhaustion
            | FindingKind::MissingRateLimit
            | FindingKind::MissingSecurityHeader => 2,
            FindingKind::MissingWsSecurity => 1,
            FindingKind::SchemaDisclosure => 0,
        };
        base + tuning
    }
}

/// A confirmed or strongly-evidenced vulnerability instance tied to one
/// endpoint. Append-only: corrections require a new Finding, never a
/// mutation, so severity and CVSS stay consistent once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub endpoint: EndpointId,
    pub evidence: String,
    pub cvss_score: f64,
    pub weakness_id: String,
    pub recommendation: String,
}

impl Finding {
    fn build(kind: FindingKind, severity: Severity, endpoint: EndpointId, evidence: String) -> Self {
        Self {
            kind,
            severity,
            endpoint,
            evidence,
            cvss_score: cvss_for(kind, severity),
            weakness_id: kind.weakness_id().to_string(),
            recommendation: kind.recommendation().to_string(),
        }
    }

    pub fn critical(kind: FindingKind, endpoint: EndpointId, evidence: impl Into<String>) -> Self {
        Self::build(kind, Severity::Critical, endpoint, evidence.into())
    }

    pub fn high(kind: FindingKind, endpoint: EndpointId, evidence: impl Into<String>) -> Self {
        Self::build(kind, Severity::High, endpoint, evidence.into())
    }

    pub fn medium(kind: FindingKind, endpoint: EndpointId, evidence: impl Into<String>) -> Self {
        Self::build(kind, Severity::Medium, endpoint, evidence.into())
    }

    pub fn low(kind: FindingKind, endpoint: EndpointId, evidence: impl Into<String>) -> Self {
        Self::build(kind, Severity::Low, endpoint, evidence.into())
    }

    pub fn info(kind: FindingKind, endpoint: EndpointId, evidence: impl Into<String>) -> Self {
        Self::build(kind, Severity::Info, endpoint, evidence.into())
    }
}

/// Severity and CVSS are paired in one place so they can never drift apart.
fn cvss_for(kind: FindingKind, severity: Severity) -> f64 {
    match (kind, severity) {
        (FindingKind::SqlInjection, Severity::Critical) => 9.8,
        (FindingKind::CommandInjection, Severity::Critical) => 9.8,
        (FindingKind::XmlExternalEntity, Severity::Critical) => 9.4,
        (FindingKind::VerticalPrivilegeEscalation, Severity::Critical) => 8.8,
        (FindingKind::MissingAuthentication, Severity::High) => 8.2,
        (FindingKind::HorizontalPrivilegeEscalation, Severity::High) => 8.1,
        (FindingKind::ReflectedXss, Severity::High) => 7.1,
        (_, Severity::Critical) => 9.1,
        (_, Severity::High) => 7.5,
        (_, Severity::Medium) => 5.3,
        (_, Severity::Low) => 3.1,
        (_, Severity::Info) => 0.0,
    }
}
