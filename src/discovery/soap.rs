use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;

use super::DiscoveryOutcome;
use crate::config::ScanContext;
use crate::http::HttpClient;
use crate::models::{
    DiscoverySource, Endpoint, Finding, FindingKind, HttpMethod, ParamLocation, ParamType,
    ParameterSpec, Protocol, SessionNote,
};

/// Candidate WSDL locations relative to the configured SOAP path.
const WSDL_SUFFIXES: &[&str] = &["?wsdl", "?WSDL", "/service.wsdl"];

pub async fn discover(transport: &HttpClient, ctx: &ScanContext) -> DiscoveryOutcome {
    let mut outcome = DiscoveryOutcome::default();

    for suffix in WSDL_SUFFIXES {
        if ctx.cancel.is_cancelled() {
            return outcome;
        }
        let url = format!("{}{}", ctx.url_for(&ctx.soap_path), suffix);
        let result = transport.send(HttpMethod::Get, &url, &[], None).await;
        if !result.is_success() || !result.body.contains("definitions") {
            continue;
        }

        let wsdl = parse_wsdl(&result.body);
        if wsdl.operations.is_empty() {
            outcome.notes.push(SessionNote::new(
                "discovery/soap",
                format!("WSDL at {} declared no operations", suffix),
            ));
            continue;
        }

        let service_path = wsdl.service_path.clone().unwrap_or_else(|| ctx.soap_path.clone());
        let root = Endpoint::new(Protocol::Soap, HttpMethod::Post, &service_path, DiscoverySource::Wsdl);

        // WS-Security posture is a property of the service contract, so the
        // check happens here rather than in a probe.
        if !wsdl.has_security_policy {
            outcome.findings.push(Finding::medium(
                FindingKind::MissingWsSecurity,
                root.id(),
                "WSDL declares no WS-Security policy element".to_string(),
            ));
        }

        outcome.endpoints.push(root);
        for operation in &wsdl.operations {
            outcome.endpoints.push(
                Endpoint::new(Protocol::Soap, HttpMethod::Post, operation, DiscoverySource::Wsdl)
                    .with_parameters(generic_body_params()),
            );
        }
        outcome.notes.push(SessionNote::new(
            "discovery/soap",
            format!("parsed WSDL ({} operations)", wsdl.operations.len()),
        ));
        return outcome;
    }

    outcome.notes.push(SessionNote::new(
        "discovery/soap",
        "no WSDL document found",
    ));
    outcome
}

#[derive(Debug, Default)]
struct ParsedWsdl {
    operations: Vec<String>,
    service_path: Option<String>,
    has_security_policy: bool,
}

/// Event-driven pass over the WSDL: `operation` elements (portType and
/// binding both; the set dedups), the `address` location, and any
/// policy/security element.
fn parse_wsdl(content: &str) -> ParsedWsdl {
    let mut reader = Reader::from_str(content);
    let mut parsed = ParsedWsdl::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match local.as_str() {
                    "operation" => {
                        if let Some(name) = attribute(&e, "name") {
                            if seen.insert(name.clone()) {
                                parsed.operations.push(name);
                            }
                        }
                    }
                    "address" => {
                        if let Some(location) = attribute(&e, "location") {
                            parsed.service_path = url_path(&location);
                        }
                    }
                    _ => {
                        let lower = local.to_lowercase();
                        if lower.contains("policy")
                            || lower.contains("security")
                            || lower.contains("usernametoken")
                        {
                            parsed.has_security_policy = true;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    parsed
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element.attributes().flatten().find_map(|attr| {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            attr.unescape_value().ok().map(|v| v.to_string())
        } else {
            None
        }
    })
}

fn url_path(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme.find('/').map(|i| without_scheme[i..].to_string())
}

fn generic_body_params() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new("id", ParamLocation::Body, ParamType::Integer, false),
        ParameterSpec::new("name", ParamLocation::Body, ParamType::String, false),
        ParameterSpec::new("query", ParamLocation::Body, ParamType::String, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSDL: &str = r#"<?xml version="1.0"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/">
  <wsdl:portType name="UserServicePort">
    <wsdl:operation name="GetUser"/>
    <wsdl:operation name="DeleteUser"/>
  </wsdl:portType>
  <wsdl:binding name="UserServiceBinding" type="tns:UserServicePort">
    <wsdl:operation name="GetUser">
      <soap:operation soapAction="GetUser"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="UserService">
    <wsdl:port name="UserServicePort" binding="tns:UserServiceBinding">
      <soap:address location="http://example.com/services/users"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_operations_deduplicated_across_port_and_binding() {
        let parsed = parse_wsdl(WSDL);
        assert_eq!(parsed.operations, vec!["GetUser".to_string(), "DeleteUser".to_string()]);
    }

    #[test]
    fn test_service_address_path_extracted() {
        let parsed = parse_wsdl(WSDL);
        assert_eq!(parsed.service_path.as_deref(), Some("/services/users"));
    }

    #[test]
    fn test_missing_security_policy_detected() {
        let parsed = parse_wsdl(WSDL);
        assert!(!parsed.has_security_policy);
    }

    #[test]
    fn test_security_policy_element_recognized() {
        let secured = WSDL.replace(
            "<wsdl:portType",
            "<wsp:Policy xmlns:wsp=\"http://www.w3.org/ns/ws-policy\"/><wsdl:portType",
        );
        let parsed = parse_wsdl(&secured);
        assert!(parsed.has_security_policy);
    }

    #[test]
    fn test_malformed_wsdl_yields_empty() {
        let parsed = parse_wsdl("<definitions><operation</definitions>");
        assert!(parsed.operations.is_empty());
    }
}
