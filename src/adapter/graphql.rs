use async_trait::async_trait;
use std::sync::Arc;

use super::{ProbeRequest, ProtocolAdapter};
use crate::config::ScanContext;
use crate::http::{HttpClient, ProbeResult};
use crate::models::{Endpoint, HttpMethod, ParamType, Protocol};

/// Sends GraphQL operations. Endpoint paths are `Root.field` pairs emitted
/// by introspection discovery (`Query.users`, `Mutation.createUser`); the
/// service root endpoint keeps its URL path and gets a bare `__typename`
/// query.
pub struct GraphQlAdapter {
    transport: Arc<HttpClient>,
    ctx: Arc<ScanContext>,
}

impl GraphQlAdapter {
    pub fn new(transport: Arc<HttpClient>, ctx: Arc<ScanContext>) -> Self {
        Self { transport, ctx }
    }

    fn operation_for(endpoint: &Endpoint, request: &ProbeRequest) -> String {
        let Some((root, field)) = endpoint.path.split_once('.') else {
            return "{ __typename }".to_string();
        };
        let keyword = match root {
            "Mutation" => "mutation",
            "Subscription" => "subscription",
            _ => "query",
        };

        let args: Vec<String> = endpoint
            .parameters
            .iter()
            .filter_map(|p| {
                let value = request
                    .param_values
                    .get(&p.name)
                    .cloned()
                    .or_else(|| p.required.then(|| p.default_value()))?;
                let rendered = match p.data_type {
                    ParamType::Integer | ParamType::Boolean => value,
                    _ => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
                };
                Some(format!("{}: {}", p.name, rendered))
            })
            .collect();

        let arg_list = if args.is_empty() {
            String::new()
        } else {
            format!("({})", args.join(", "))
        };
        format!("{} {{ {}{} {{ __typename }} }}", keyword, field, arg_list)
    }
}

#[async_trait]
impl ProtocolAdapter for GraphQlAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::GraphQl
    }

    async fn send(&self, endpoint: &Endpoint, request: &ProbeRequest) -> ProbeResult {
        let body = match &request.body_override {
            Some(body) => body.clone(),
            None => {
                let operation = Self::operation_for(endpoint, request);
                serde_json::json!({ "query": operation }).to_string()
            }
        };

        let mut headers: Vec<(String, String)> = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let tier = self.ctx.credentials.tier(request.tier);
        if let Some(token) = &tier.token {
            headers.push((tier.header_name.clone(), token.clone()));
        }
        headers.extend(request.extra_headers.iter().cloned());

        self.transport
            .send(HttpMethod::Post, &self.ctx.graphql_url(), &headers, Some(body))
            .await
    }
}
