use regex::Regex;

use crate::models::{FindingKind, Severity};

/// A response-body signature fed to probes as data, not code: new signatures
/// extend these tables without touching probe logic.
#[derive(Debug)]
pub struct SignaturePattern {
    pub pattern: Regex,
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: &'static str,
}

impl SignaturePattern {
    fn new(pattern: &str, kind: FindingKind, severity: Severity, description: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid signature pattern"),
            kind,
            severity,
            description,
        }
    }

    pub fn matches(&self, body: &str) -> bool {
        self.pattern.is_match(body)
    }
}

pub fn sql_error_signatures() -> Vec<SignaturePattern> {
    vec![
        SignaturePattern::new(
            r"(?i)you have an error in your sql syntax",
            FindingKind::SqlInjection,
            Severity::Critical,
            "MySQL syntax error in response",
        ),
        SignaturePattern::new(
            r"(?i)(pg_query|pg_exec)\(\)|unterminated quoted string|syntax error at or near",
            FindingKind::SqlInjection,
            Severity::Critical,
            "PostgreSQL error in response",
        ),
        SignaturePattern::new(
            r"(?i)sqlite3?\.OperationalError|SQLITE_ERROR|unrecognized token",
            FindingKind::SqlInjection,
            Severity::Critical,
            "SQLite error in response",
        ),
        SignaturePattern::new(
            r"(?i)unclosed quotation mark after the character string|Incorrect syntax near",
            FindingKind::SqlInjection,
            Severity::Critical,
            "SQL Server error in response",
        ),
        SignaturePattern::new(
            r"(?i)ORA-\d{5}|Oracle error",
            FindingKind::SqlInjection,
            Severity::Critical,
            "Oracle error in response",
        ),
        SignaturePattern::new(
            r"(?i)\[ODBC (SQL Server|Microsoft Access) Driver\]|java\.sql\.SQLException",
            FindingKind::SqlInjection,
            Severity::Critical,
            "Driver-level SQL error in response",
        ),
    ]
}

pub fn command_signatures() -> Vec<SignaturePattern> {
    vec![
        SignaturePattern::new(
            r"uid=\d+\([a-z_][a-z0-9_-]*\)\s+gid=\d+",
            FindingKind::CommandInjection,
            Severity::Critical,
            "id(1) output in response",
        ),
        SignaturePattern::new(
            r"root:[x*]?:0:0:",
            FindingKind::CommandInjection,
            Severity::Critical,
            "/etc/passwd content in response",
        ),
        SignaturePattern::new(
            r"(?i)sh: \d+: .*not found|command not found",
            FindingKind::CommandInjection,
            Severity::Critical,
            "shell error in response",
        ),
    ]
}

pub fn path_traversal_signatures() -> Vec<SignaturePattern> {
    vec![
        SignaturePattern::new(
            r"root:[x*]?:0:0:",
            FindingKind::PathTraversal,
            Severity::High,
            "/etc/passwd content in response",
        ),
        SignaturePattern::new(
            r"(?i)\[boot loader\]|\[fonts\]",
            FindingKind::PathTraversal,
            Severity::High,
            "win.ini content in response",
        ),
    ]
}

pub fn xxe_signatures() -> Vec<SignaturePattern> {
    vec![
        SignaturePattern::new(
            r"root:[x*]?:0:0:",
            FindingKind::XmlExternalEntity,
            Severity::Critical,
            "local file content resolved via external entity",
        ),
        SignaturePattern::new(
            r"(?i)(javax\.xml|org\.xml\.sax|libxml2?|lxml)\S*(exception|error)",
            FindingKind::XmlExternalEntity,
            Severity::High,
            "XML parser error exposing entity processing",
        ),
    ]
}

/// Three sensitive-data pattern classes: credentials, personal data,
/// internal/debug detail. Each class is one finding with its own severity.
pub struct ExposureClass {
    pub label: &'static str,
    pub severity: Severity,
    pub patterns: Vec<Regex>,
}

pub fn exposure_classes() -> Vec<ExposureClass> {
    fn re(p: &str) -> Regex {
        Regex::new(p).expect("invalid exposure pattern")
    }
    vec![
        ExposureClass {
            label: "credentials",
            severity: Severity::Critical,
            patterns: vec![
                re(r#"(?i)"?(password|passwd|secret|api[_-]?key|access[_-]?token)"?\s*[:=]\s*"?[^\s",}{]{4,}"#),
                re(r"-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----"),
                re(r"\bAKIA[0-9A-Z]{16}\b"),
                re(r"\beyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b"),
            ],
        },
        ExposureClass {
            label: "personal data",
            severity: Severity::High,
            patterns: vec![
                re(r"\b\d{3}-\d{2}-\d{4}\b"),
                re(r"\b(?:4\d{3}|5[1-5]\d{2})[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b"),
                re(r"(?i)\b(ssn|social[_-]?security|date[_-]?of[_-]?birth)\b"),
            ],
        },
        ExposureClass {
            label: "internal/debug info",
            severity: Severity::Medium,
            patterns: vec![
                re(r"(?i)Traceback \(most recent call last\)"),
                re(r"\bat [\w$.]+\([\w$]+\.java:\d+\)"),
                re(r#"(?i)"stack_?trace"\s*:"#),
                re(r"\b(?:10\.\d{1,3}|192\.168|172\.(?:1[6-9]|2\d|3[01]))\.\d{1,3}\.\d{1,3}\b"),
            ],
        },
    ]
}
