use serde::{Deserialize, Serialize};
use std::fmt;

/// Privilege tier a request is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialTier {
    Anonymous,
    Normal,
    Elevated,
}

impl fmt::Display for CredentialTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialTier::Anonymous => "anonymous",
            CredentialTier::Normal => "normal",
            CredentialTier::Elevated => "elevated",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    pub token: Option<String>,
    pub header_name: String,
}

impl TierConfig {
    pub fn anonymous() -> Self {
        Self {
            token: None,
            header_name: "Authorization".to_string(),
        }
    }

    pub fn with_token(token: String, header_name: String) -> Self {
        Self {
            token: Some(token),
            header_name,
        }
    }
}

/// Credential material for the three privilege tiers a scan exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub anonymous: TierConfig,
    pub normal: TierConfig,
    pub elevated: TierConfig,
}

impl Credentials {
    pub fn tier(&self, tier: CredentialTier) -> &TierConfig {
        match tier {
            CredentialTier::Anonymous => &self.anonymous,
            CredentialTier::Normal => &self.normal,
            CredentialTier::Elevated => &self.elevated,
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            anonymous: TierConfig::anonymous(),
            normal: TierConfig::anonymous(),
            elevated: TierConfig::anonymous(),
        }
    }
}
