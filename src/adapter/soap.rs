use async_trait::async_trait;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;
use std::sync::Arc;

use super::{ProbeRequest, ProtocolAdapter};
use crate::config::ScanContext;
use crate::http::{HttpClient, ProbeResult};
use crate::models::{Endpoint, HttpMethod, ParamLocation, Protocol};

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Wraps operations in SOAP envelopes. Endpoint paths are WSDL operation
/// names; the service root endpoint (path starting with `/`) gets a generic
/// envelope so service-level probes still have something to send.
pub struct SoapAdapter {
    transport: Arc<HttpClient>,
    ctx: Arc<ScanContext>,
}

impl SoapAdapter {
    pub fn new(transport: Arc<HttpClient>, ctx: Arc<ScanContext>) -> Self {
        Self { transport, ctx }
    }

    fn envelope_for(endpoint: &Endpoint, request: &ProbeRequest) -> String {
        let operation = if endpoint.path.starts_with('/') {
            "Request"
        } else {
            endpoint.path.as_str()
        };

        // Writing into an in-memory buffer cannot fail.
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut envelope = BytesStart::new("soapenv:Envelope");
        envelope.push_attribute(("xmlns:soapenv", SOAP_ENV_NS));
        writer
            .write_event(Event::Start(envelope))
            .expect("envelope write failed");
        writer
            .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
            .expect("envelope write failed");
        writer
            .write_event(Event::Start(BytesStart::new("soapenv:Body")))
            .expect("envelope write failed");
        writer
            .write_event(Event::Start(BytesStart::new(operation)))
            .expect("envelope write failed");

        for param in endpoint
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
        {
            let value = match request.param_values.get(&param.name) {
                Some(v) => v.clone(),
                None if param.required => param.default_value(),
                None => continue,
            };
            writer
                .write_event(Event::Start(BytesStart::new(param.name.as_str())))
                .expect("envelope write failed");
            writer
                .write_event(Event::Text(BytesText::new(&value)))
                .expect("envelope write failed");
            writer
                .write_event(Event::End(BytesEnd::new(param.name.as_str())))
                .expect("envelope write failed");
        }

        writer
            .write_event(Event::End(BytesEnd::new(operation)))
            .expect("envelope write failed");
        writer
            .write_event(Event::End(BytesEnd::new("soapenv:Body")))
            .expect("envelope write failed");
        writer
            .write_event(Event::End(BytesEnd::new("soapenv:Envelope")))
            .expect("envelope write failed");

        String::from_utf8(writer.into_inner().into_inner()).expect("envelope is valid utf-8")
    }

    fn service_url(&self, endpoint: &Endpoint) -> String {
        if endpoint.path.starts_with('/') {
            self.ctx.url_for(&endpoint.path)
        } else {
            self.ctx.url_for(&self.ctx.soap_path)
        }
    }
}

#[async_trait]
impl ProtocolAdapter for SoapAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Soap
    }

    async fn send(&self, endpoint: &Endpoint, request: &ProbeRequest) -> ProbeResult {
        let body = request
            .body_override
            .clone()
            .unwrap_or_else(|| Self::envelope_for(endpoint, request));

        let action = if endpoint.path.starts_with('/') {
            String::new()
        } else {
            endpoint.path.clone()
        };
        let mut headers: Vec<(String, String)> = vec![
            ("Content-Type".to_string(), "text/xml; charset=utf-8".to_string()),
            ("SOAPAction".to_string(), format!("\"{}\"", action)),
        ];
        let tier = self.ctx.credentials.tier(request.tier);
        if let Some(token) = &tier.token {
            headers.push((tier.header_name.clone(), token.clone()));
        }
        headers.extend(request.extra_headers.iter().cloned());

        self.transport
            .send(HttpMethod::Post, &self.service_url(endpoint), &headers, Some(body))
            .await
    }
}
