mod graphql;
mod rest;
mod soap;

pub use graphql::GraphQlAdapter;
pub use rest::RestAdapter;
pub use soap::SoapAdapter;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::http::ProbeResult;
use crate::models::{CredentialTier, Endpoint, Protocol};

/// Abstract probe intent. Probes describe what to send in protocol-neutral
/// terms; the adapter turns it into a protocol-correct request.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub tier: CredentialTier,
    /// Values for named parameters, overriding per-parameter defaults.
    pub param_values: HashMap<String, String>,
    pub extra_headers: Vec<(String, String)>,
    /// Replaces the entire request body when set. Used for XML/XXE and
    /// complexity payloads that do not map onto declared parameters.
    pub body_override: Option<String>,
}

impl ProbeRequest {
    pub fn for_tier(tier: CredentialTier) -> Self {
        Self {
            tier,
            param_values: HashMap::new(),
            extra_headers: Vec::new(),
            body_override: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::for_tier(CredentialTier::Anonymous)
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.param_values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body_override = Some(body);
        self
    }
}

/// Translates probe intents into wire requests and hands back the raw
/// transport outcome. Probes never talk to the transport client directly.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn send(&self, endpoint: &Endpoint, request: &ProbeRequest) -> ProbeResult;
}
