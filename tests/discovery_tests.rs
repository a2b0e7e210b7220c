use talon::discovery::OpenApiParser;
use talon::models::{
    DiscoverySource, Endpoint, EndpointSet, HttpMethod, ParamLocation, ParameterSpec, Protocol,
};

const OPENAPI_V3: &str = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Shop", "version": "1"},
  "paths": {
    "/api/orders": {
      "get": {
        "parameters": [
          {"name": "limit", "in": "query", "schema": {"type": "integer"}}
        ]
      },
      "post": {
        "requestBody": {
          "content": {
            "application/json": {
              "schema": {
                "type": "object",
                "required": ["productId"],
                "properties": {
                  "productId": {"type": "integer"},
                  "note": {"type": "string"}
                }
              }
            }
          }
        }
      }
    },
    "/api/orders/{orderId}": {
      "get": {}
    }
  }
}"#;

const SWAGGER_V2: &str = r#"{
  "swagger": "2.0",
  "info": {"title": "Shop", "version": "1"},
  "paths": {
    "/users/{id}": {
      "delete": {
        "parameters": [
          {"name": "id", "in": "path", "required": true, "type": "integer"}
        ]
      }
    }
  }
}"#;

#[test]
fn openapi_v3_operations_become_endpoints() {
    let endpoints = OpenApiParser::new().parse_content(OPENAPI_V3).unwrap();
    assert_eq!(endpoints.len(), 3);

    let list = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Get && e.path == "/api/orders")
        .unwrap();
    assert!(list
        .parameters
        .iter()
        .any(|p| p.name == "limit" && p.location == ParamLocation::Query));

    let create = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Post && e.path == "/api/orders")
        .unwrap();
    let product = create.parameters.iter().find(|p| p.name == "productId").unwrap();
    assert_eq!(product.location, ParamLocation::Body);
    assert!(product.required);

    let detail = endpoints
        .iter()
        .find(|e| e.path == "/api/orders/{orderId}")
        .unwrap();
    assert!(detail
        .parameters
        .iter()
        .any(|p| p.name == "orderId" && p.location == ParamLocation::Path));
}

#[test]
fn swagger_v2_is_supported() {
    let endpoints = OpenApiParser::new().parse_content(SWAGGER_V2).unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].method, HttpMethod::Delete);
    assert_eq!(endpoints[0].source, DiscoverySource::SpecDocument);
}

#[test]
fn malformed_documents_are_rejected_not_panicked() {
    let parser = OpenApiParser::new();
    assert!(parser.parse_content("not json at all").is_err());
    assert!(parser.parse_content(r#"{"openapi": "3.0.0"}"#).is_err());
    assert!(parser.parse_content(r#"{"random": true}"#).is_err());
}

#[test]
fn endpoint_set_keeps_one_entry_per_identity_across_sources() {
    let mut set = EndpointSet::new();
    let spec_endpoints = OpenApiParser::new().parse_content(OPENAPI_V3).unwrap();
    let declared_params = spec_endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Get && e.path == "/api/orders")
        .unwrap()
        .parameters
        .clone();

    // Fuzz pass found the same path first, with guessed parameters.
    set.insert(
        Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api/orders",
            DiscoverySource::PathFuzz,
        )
        .with_parameters(ParameterSpec::fallback_list()),
    );
    set.extend(spec_endpoints);

    let survivors: Vec<_> = set
        .into_vec()
        .into_iter()
        .filter(|e| e.method == HttpMethod::Get && e.path == "/api/orders")
        .collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].source, DiscoverySource::SpecDocument);
    assert_eq!(survivors[0].parameters.len(), declared_params.len());
}
