use serde_json::Value;

use super::DiscoveryOutcome;
use crate::config::ScanContext;
use crate::http::HttpClient;
use crate::models::{
    DiscoverySource, Endpoint, Finding, FindingKind, HttpMethod, ParamLocation, ParamType,
    ParameterSpec, Protocol, SessionNote,
};

/// Standard introspection query, trimmed to the fields schema walking needs.
const INTROSPECTION_QUERY: &str = r#"{
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        args {
          name
          type { kind name ofType { kind name ofType { kind name } } }
        }
      }
    }
  }
}"#;

pub async fn discover(transport: &HttpClient, ctx: &ScanContext) -> DiscoveryOutcome {
    let mut outcome = DiscoveryOutcome::default();

    let body = serde_json::json!({ "query": INTROSPECTION_QUERY }).to_string();
    let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    let result = transport
        .send(HttpMethod::Post, &ctx.graphql_url(), &headers, Some(body))
        .await;

    if result.is_transport_error() {
        outcome.notes.push(SessionNote::new(
            "discovery/graphql",
            format!("introspection request failed: {}", result.error.as_ref().map(|e| e.to_string()).unwrap_or_default()),
        ));
        return outcome;
    }

    match walk_schema(&result.body, &ctx.graphql_path) {
        Some(walked) => {
            // Fuzz-only GraphQL discovery is out of scope, so an open schema
            // is the one informational finding this phase can emit.
            let root = &walked.endpoints[0];
            outcome.findings.push(Finding::info(
                FindingKind::SchemaDisclosure,
                root.id(),
                format!(
                    "introspection enabled: {} schema types, {} operations exposed",
                    walked.type_count,
                    walked.endpoints.len() - 1
                ),
            ));
            outcome.endpoints = walked.endpoints;
        }
        None => {
            outcome.notes.push(SessionNote::new(
                "discovery/graphql",
                format!("introspection disabled or not a GraphQL endpoint (status {})", result.status),
            ));
        }
    }

    outcome
}

struct WalkedSchema {
    /// Service root first, then one endpoint per root-type field.
    endpoints: Vec<Endpoint>,
    type_count: usize,
}

/// Walks `Query`/`Mutation`/`Subscription` root types into flat endpoint
/// entries; field arguments become body-located parameter specs.
fn walk_schema(body: &str, graphql_path: &str) -> Option<WalkedSchema> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let schema = parsed.get("data")?.get("__schema")?;

    let mut roots: Vec<(String, &str)> = Vec::new();
    for (key, label) in [
        ("queryType", "Query"),
        ("mutationType", "Mutation"),
        ("subscriptionType", "Subscription"),
    ] {
        if let Some(name) = schema.get(key).and_then(|t| t.get("name")).and_then(|n| n.as_str()) {
            roots.push((name.to_string(), label));
        }
    }
    let types = schema.get("types")?.as_array()?;

    let mut endpoints = vec![Endpoint::new(
        Protocol::GraphQl,
        HttpMethod::Post,
        graphql_path,
        DiscoverySource::Introspection,
    )];

    for type_def in types {
        let Some(type_name) = type_def.get("name").and_then(|n| n.as_str()) else {
            continue;
        };
        let Some((_, label)) = roots.iter().find(|(root, _)| root == type_name) else {
            continue;
        };
        let Some(fields) = type_def.get("fields").and_then(|f| f.as_array()) else {
            continue;
        };

        for field in fields {
            let Some(field_name) = field.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            let parameters = field
                .get("args")
                .and_then(|a| a.as_array())
                .map(|args| args.iter().filter_map(parse_argument).collect())
                .unwrap_or_default();

            endpoints.push(
                Endpoint::new(
                    Protocol::GraphQl,
                    HttpMethod::Post,
                    &format!("{}.{}", label, field_name),
                    DiscoverySource::Introspection,
                )
                .with_parameters(parameters),
            );
        }
    }

    if endpoints.len() == 1 {
        return None;
    }
    Some(WalkedSchema {
        endpoints,
        type_count: types.len(),
    })
}

fn parse_argument(arg: &Value) -> Option<ParameterSpec> {
    let name = arg.get("name")?.as_str()?.to_string();
    let type_def = arg.get("type")?;
    let required = type_def.get("kind").and_then(|k| k.as_str()) == Some("NON_NULL");
    let data_type = scalar_type(unwrap_type(type_def));
    Some(ParameterSpec {
        name,
        location: ParamLocation::Body,
        data_type,
        required,
    })
}

/// Strips NON_NULL/LIST wrappers down to the named type.
fn unwrap_type(type_def: &Value) -> &Value {
    let mut current = type_def;
    while current.get("name").map(|n| n.is_null()).unwrap_or(true) {
        match current.get("ofType") {
            Some(inner) if !inner.is_null() => current = inner,
            _ => break,
        }
    }
    current
}

fn scalar_type(type_def: &Value) -> ParamType {
    match type_def.get("name").and_then(|n| n.as_str()) {
        Some("Int") | Some("Float") => ParamType::Integer,
        Some("Boolean") => ParamType::Boolean,
        Some("ID") => ParamType::Uuid,
        _ => ParamType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn introspection_body() -> String {
        serde_json::json!({
            "data": {
                "__schema": {
                    "queryType": {"name": "Query"},
                    "mutationType": {"name": "Mutation"},
                    "subscriptionType": null,
                    "types": [
                        {
                            "kind": "OBJECT",
                            "name": "Query",
                            "fields": [
                                {
                                    "name": "user",
                                    "args": [
                                        {"name": "id", "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "ID"}}}
                                    ]
                                },
                                {"name": "users", "args": []}
                            ]
                        },
                        {
                            "kind": "OBJECT",
                            "name": "Mutation",
                            "fields": [
                                {
                                    "name": "deleteUser",
                                    "args": [
                                        {"name": "id", "type": {"kind": "SCALAR", "name": "Int"}}
                                    ]
                                }
                            ]
                        },
                        {"kind": "OBJECT", "name": "User", "fields": [{"name": "email", "args": []}]}
                    ]
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_walk_emits_root_and_field_endpoints() {
        let walked = walk_schema(&introspection_body(), "/graphql").unwrap();
        // root + 2 queries + 1 mutation; User is not a root type
        assert_eq!(walked.endpoints.len(), 4);
        assert_eq!(walked.endpoints[0].path, "/graphql");
        assert!(walked.endpoints.iter().any(|e| e.path == "Query.user"));
        assert!(walked.endpoints.iter().any(|e| e.path == "Mutation.deleteUser"));
        assert!(!walked.endpoints.iter().any(|e| e.path.contains("email")));
    }

    #[test]
    fn test_non_null_argument_required() {
        let walked = walk_schema(&introspection_body(), "/graphql").unwrap();
        let user = walked.endpoints.iter().find(|e| e.path == "Query.user").unwrap();
        assert_eq!(user.parameters.len(), 1);
        assert!(user.parameters[0].required);
        assert_eq!(user.parameters[0].data_type, ParamType::Uuid);
    }

    #[test]
    fn test_disabled_introspection_yields_none() {
        let body = r#"{"errors":[{"message":"introspection is disabled"}]}"#;
        assert!(walk_schema(body, "/graphql").is_none());
    }

    #[test]
    fn test_non_json_body_yields_none() {
        assert!(walk_schema("<html>not graphql</html>", "/graphql").is_none());
    }
}
