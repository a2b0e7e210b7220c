use async_trait::async_trait;
use std::sync::Arc;

use super::{ProbeRequest, ProtocolAdapter};
use crate::config::ScanContext;
use crate::http::{HttpClient, ProbeResult};
use crate::models::{Endpoint, ParamLocation, Protocol};

pub struct RestAdapter {
    transport: Arc<HttpClient>,
    ctx: Arc<ScanContext>,
}

impl RestAdapter {
    pub fn new(transport: Arc<HttpClient>, ctx: Arc<ScanContext>) -> Self {
        Self { transport, ctx }
    }

    fn build_query(&self, endpoint: &Endpoint, request: &ProbeRequest) -> String {
        let pairs: Vec<String> = endpoint
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Query)
            .filter_map(|p| {
                let value = request
                    .param_values
                    .get(&p.name)
                    .cloned()
                    .or_else(|| p.required.then(|| p.default_value()))?;
                Some(format!(
                    "{}={}",
                    urlencoding::encode(&p.name),
                    urlencoding::encode(&value)
                ))
            })
            .collect();
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }

    fn build_body(&self, endpoint: &Endpoint, request: &ProbeRequest) -> Option<String> {
        if let Some(body) = &request.body_override {
            return Some(body.clone());
        }
        if !endpoint.method.requires_body() {
            return None;
        }
        let mut object = serde_json::Map::new();
        for param in endpoint
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
        {
            let value = request
                .param_values
                .get(&param.name)
                .cloned()
                .unwrap_or_else(|| param.default_value());
            object.insert(param.name.clone(), serde_json::Value::String(value));
        }
        if object.is_empty() {
            Some("{}".to_string())
        } else {
            Some(serde_json::Value::Object(object).to_string())
        }
    }
}

#[async_trait]
impl ProtocolAdapter for RestAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    async fn send(&self, endpoint: &Endpoint, request: &ProbeRequest) -> ProbeResult {
        let resolved = endpoint.resolve_path(&request.param_values);
        let url = format!("{}{}", self.ctx.url_for(&resolved), self.build_query(endpoint, request));

        let mut headers: Vec<(String, String)> = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let tier = self.ctx.credentials.tier(request.tier);
        if let Some(token) = &tier.token {
            headers.push((tier.header_name.clone(), token.clone()));
        }
        for param in endpoint
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Header)
        {
            if let Some(value) = request.param_values.get(&param.name) {
                headers.push((param.name.clone(), value.clone()));
            }
        }
        headers.extend(request.extra_headers.iter().cloned());

        let body = self.build_body(endpoint, request);
        self.transport.send(endpoint.method, &url, &headers, body).await
    }
}
