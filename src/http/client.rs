use anyhow::Result;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::TransportError;
use crate::models::HttpMethod;

/// Raw transport outcome of one request. HTTP 4xx/5xx are valid results;
/// only network-level failures populate `error`. Ephemeral: produced and
/// consumed within a single probe invocation.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub status: u16,
    /// Response headers in wire order; lookup is case-insensitive.
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed_ms: u64,
    pub error: Option<TransportError>,
}

impl ProbeResult {
    pub fn failed(error: TransportError, elapsed_ms: u64) -> Self {
        Self {
            status: 0,
            headers: Vec::new(),
            body: String::new(),
            elapsed_ms,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }

    pub fn is_transport_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// The only component that touches the network. No retries: repeating a
/// request is a probe-level decision, since repeats can trigger lockouts or
/// themselves constitute a DoS test.
pub struct HttpClient {
    client: Client,
    cancel: CancellationToken,
    request_timeout_ms: u64,
}

impl HttpClient {
    pub fn new(request_timeout: Duration, cancel: CancellationToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .danger_accept_invalid_certs(false)
            .build()?;
        Ok(Self {
            client,
            cancel,
            request_timeout_ms: request_timeout.as_millis() as u64,
        })
    }

    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> ProbeResult {
        if self.cancel.is_cancelled() {
            return ProbeResult::failed(TransportError::Cancelled, 0);
        }

        let start = Instant::now();
        let mut request = self.client.request(Self::to_reqwest_method(method), url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        if let Some(b) = body {
            request = request.body(b);
        }

        let sent = tokio::select! {
            _ = self.cancel.cancelled() => {
                return ProbeResult::failed(
                    TransportError::Cancelled,
                    start.elapsed().as_millis() as u64,
                );
            }
            result = request.send() => result,
        };

        match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                let headers: Vec<(String, String)> = response
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect();
                let body = tokio::select! {
                    _ = self.cancel.cancelled() => String::new(),
                    text = response.text() => text.unwrap_or_default(),
                };
                ProbeResult {
                    status,
                    headers,
                    body,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let error = if e.is_timeout() {
                    TransportError::Timeout(self.request_timeout_ms)
                } else {
                    TransportError::Connection(e.to_string())
                };
                ProbeResult::failed(error, elapsed_ms)
            }
        }
    }

    fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_case_insensitive() {
        let result = ProbeResult {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: String::new(),
            elapsed_ms: 12,
            error: None,
        };
        assert_eq!(result.header("content-type"), Some("application/json"));
        assert!(result.has_header("CONTENT-TYPE"));
        assert!(!result.has_header("x-frame-options"));
    }

    #[test]
    fn test_failed_result_is_not_success() {
        let result = ProbeResult::failed(TransportError::Timeout(10_000), 10_000);
        assert!(result.is_transport_error());
        assert!(!result.is_success());
    }
}
