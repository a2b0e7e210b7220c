mod graphql;
mod openapi;
mod rest;
mod soap;

pub use openapi::OpenApiParser;

use std::sync::Arc;

use crate::config::{ProtocolSelection, ScanContext};
use crate::http::HttpClient;
use crate::models::{Endpoint, EndpointSet, Finding, SessionNote};

/// What one protocol's discovery produced. Findings emitted during
/// discovery always reference endpoints in the same outcome.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub endpoints: Vec<Endpoint>,
    pub findings: Vec<Finding>,
    pub notes: Vec<SessionNote>,
}

impl DiscoveryOutcome {
    fn merge_into(self, set: &mut EndpointSet, findings: &mut Vec<Finding>, notes: &mut Vec<SessionNote>) {
        set.extend(self.endpoints);
        findings.extend(self.findings);
        notes.extend(self.notes);
    }
}

/// Drives per-protocol discovery. The three protocols share no mutable
/// state and run concurrently; the merged endpoint set is closed before any
/// probe runs.
pub struct Discovery {
    transport: Arc<HttpClient>,
    ctx: Arc<ScanContext>,
}

impl Discovery {
    pub fn new(transport: Arc<HttpClient>, ctx: Arc<ScanContext>) -> Self {
        Self { transport, ctx }
    }

    pub async fn run(&self, protocols: ProtocolSelection) -> (EndpointSet, Vec<Finding>, Vec<SessionNote>) {
        let rest = async {
            if protocols.rest {
                rest::discover(&self.transport, &self.ctx).await
            } else {
                DiscoveryOutcome::default()
            }
        };
        let graphql = async {
            if protocols.graphql {
                graphql::discover(&self.transport, &self.ctx).await
            } else {
                DiscoveryOutcome::default()
            }
        };
        let soap = async {
            if protocols.soap {
                soap::discover(&self.transport, &self.ctx).await
            } else {
                DiscoveryOutcome::default()
            }
        };

        let (rest, graphql, soap) = tokio::join!(rest, graphql, soap);

        let mut set = EndpointSet::new();
        let mut findings = Vec::new();
        let mut notes = Vec::new();
        rest.merge_into(&mut set, &mut findings, &mut notes);
        graphql.merge_into(&mut set, &mut findings, &mut notes);
        soap.merge_into(&mut set, &mut findings, &mut notes);
        (set, findings, notes)
    }
}
