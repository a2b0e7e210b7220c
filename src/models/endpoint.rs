use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Rest,
    GraphQl,
    Soap,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Rest => "REST",
            Protocol::GraphQl => "GraphQL",
            Protocol::Soap => "SOAP",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        write!(f, "{}", s)
    }
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn requires_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    String,
    Integer,
    Uuid,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParamLocation,
    pub data_type: ParamType,
    pub required: bool,
}

impl ParameterSpec {
    pub fn new(name: &str, location: ParamLocation, data_type: ParamType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            data_type,
            required,
        }
    }

    pub fn default_value(&self) -> String {
        match self.data_type {
            ParamType::String => "test".to_string(),
            ParamType::Integer => "1".to_string(),
            ParamType::Uuid => "00000000-0000-0000-0000-000000000001".to_string(),
            ParamType::Boolean => "true".to_string(),
        }
    }

    /// Whether the parameter looks like a resource identifier. Drives the
    /// horizontal-escalation probe's substitution logic.
    pub fn is_identifier(&self) -> bool {
        let lower = self.name.to_lowercase();
        matches!(self.data_type, ParamType::Uuid)
            || lower == "id"
            || lower.ends_with("_id")
            || lower.ends_with("id")
    }

    /// Generic parameter list used when discovery found an endpoint but no
    /// spec document described its inputs. Gives probes something to mutate.
    pub fn fallback_list() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("id", ParamLocation::Query, ParamType::Integer, false),
            ParameterSpec::new("q", ParamLocation::Query, ParamType::String, false),
            ParameterSpec::new("search", ParamLocation::Query, ParamType::String, false),
            ParameterSpec::new("filter", ParamLocation::Query, ParamType::String, false),
            ParameterSpec::new("file", ParamLocation::Query, ParamType::String, false),
            ParameterSpec::new("name", ParamLocation::Query, ParamType::String, false),
        ]
    }
}

/// Where an endpoint came from. Spec-backed sources are authoritative: their
/// parameter lists win over anything a fuzz pass guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverySource {
    SpecDocument,
    CommonPath,
    PathFuzz,
    Introspection,
    Wsdl,
}

impl DiscoverySource {
    pub fn is_authoritative(&self) -> bool {
        matches!(
            self,
            DiscoverySource::SpecDocument | DiscoverySource::Introspection | DiscoverySource::Wsdl
        )
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscoverySource::SpecDocument => "spec",
            DiscoverySource::CommonPath => "common-path",
            DiscoverySource::PathFuzz => "fuzz",
            DiscoverySource::Introspection => "introspection",
            DiscoverySource::Wsdl => "wsdl",
        };
        write!(f, "{}", s)
    }
}

/// Stable identity of an endpoint within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    pub protocol: Protocol,
    pub path: String,
    pub method: HttpMethod,
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.protocol, self.method, self.path)
    }
}

/// One discovered, addressable operation: path+method for REST, root-type
/// field for GraphQL, operation name for SOAP. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub path: String,
    pub method: HttpMethod,
    pub parameters: Vec<ParameterSpec>,
    pub source: DiscoverySource,
}

impl Endpoint {
    pub fn new(protocol: Protocol, method: HttpMethod, path: &str, source: DiscoverySource) -> Self {
        let path = Self::normalize_path(path);
        let parameters = if protocol == Protocol::Rest {
            Self::extract_path_params(&path)
        } else {
            Vec::new()
        };
        Self {
            protocol,
            path,
            method,
            parameters,
            source,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterSpec>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn id(&self) -> EndpointId {
        EndpointId {
            protocol: self.protocol,
            path: self.path.clone(),
            method: self.method,
        }
    }

    pub fn display_path(&self) -> String {
        format!("{:6} {}", self.method.to_string(), self.path)
    }

    pub fn identifier_params(&self) -> Vec<&ParameterSpec> {
        self.parameters.iter().filter(|p| p.is_identifier()).collect()
    }

    /// Substitute path template segments (`{id}`) with supplied or default
    /// values.
    pub fn resolve_path(&self, values: &HashMap<String, String>) -> String {
        let mut resolved = self.path.clone();
        for param in self.parameters.iter().filter(|p| p.location == ParamLocation::Path) {
            let value = values
                .get(&param.name)
                .cloned()
                .unwrap_or_else(|| param.default_value());
            resolved = resolved.replace(&format!("{{{}}}", param.name), &value);
        }
        resolved
    }

    fn normalize_path(path: &str) -> String {
        if !path.starts_with('/') {
            return path.to_string();
        }
        let mut normalized = String::with_capacity(path.len());
        let mut prev_slash = false;
        for c in path.chars() {
            if c == '/' {
                if prev_slash {
                    continue;
                }
                prev_slash = true;
            } else {
                prev_slash = false;
            }
            normalized.push(c);
        }
        if normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        normalized
    }

    fn extract_path_params(path: &str) -> Vec<ParameterSpec> {
        let mut params = Vec::new();
        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = &segment[1..segment.len() - 1];
                params.push(ParameterSpec::new(
                    name,
                    ParamLocation::Path,
                    Self::infer_param_type(name),
                    true,
                ));
            }
        }
        params
    }

    fn infer_param_type(name: &str) -> ParamType {
        let lower = name.to_lowercase();
        if lower.contains("uuid") || (lower.ends_with("_id") && lower.len() > 10) {
            ParamType::Uuid
        } else if lower.contains("id") || lower.contains("count") || lower.contains("num") {
            ParamType::Integer
        } else if lower.contains("enabled") || lower.contains("active") || lower.contains("flag") {
            ParamType::Boolean
        } else {
            ParamType::String
        }
    }
}

/// Deduplicated endpoint collection. Identity is (protocol, path, method);
/// later discoveries of a known identity are dropped, except that a
/// spec-backed source replaces the guessed parameter list of a fuzz-sourced
/// entry. Closed (read-only) before probing starts.
#[derive(Debug, Default)]
pub struct EndpointSet {
    index: HashMap<EndpointId, usize>,
    items: Vec<Endpoint>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the endpoint was new.
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        let id = endpoint.id();
        if let Some(&slot) = self.index.get(&id) {
            let existing = &mut self.items[slot];
            if endpoint.source.is_authoritative() && !existing.source.is_authoritative() {
                existing.parameters = endpoint.parameters;
                existing.source = endpoint.source;
            }
            return false;
        }
        self.index.insert(id, self.items.len());
        self.items.push(endpoint);
        true
    }

    pub fn extend(&mut self, endpoints: Vec<Endpoint>) {
        for ep in endpoints {
            self.insert(ep);
        }
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Endpoint> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_path_params() {
        let ep = Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api/users/{userId}/orders/{orderId}",
            DiscoverySource::SpecDocument,
        );
        assert_eq!(ep.parameters.len(), 2);
        assert_eq!(ep.parameters[0].name, "userId");
        assert_eq!(ep.parameters[0].location, ParamLocation::Path);
    }

    #[test]
    fn test_path_normalization() {
        let ep = Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api//users/",
            DiscoverySource::CommonPath,
        );
        assert_eq!(ep.path, "/api/users");
    }

    #[test]
    fn test_dedup_drops_duplicate_identity() {
        let mut set = EndpointSet::new();
        let a = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::CommonPath);
        let b = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::PathFuzz);
        assert!(set.insert(a));
        assert!(!set.insert(b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_same_path_different_method_is_distinct() {
        let mut set = EndpointSet::new();
        set.insert(Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::CommonPath));
        set.insert(Endpoint::new(Protocol::Rest, HttpMethod::Post, "/api/users", DiscoverySource::CommonPath));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_spec_sourced_parameters_win() {
        let mut set = EndpointSet::new();
        let fuzzed = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::PathFuzz)
            .with_parameters(ParameterSpec::fallback_list());
        let declared = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::SpecDocument)
            .with_parameters(vec![ParameterSpec::new(
                "limit",
                ParamLocation::Query,
                ParamType::Integer,
                false,
            )]);
        set.insert(fuzzed);
        set.insert(declared);

        let items = set.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, DiscoverySource::SpecDocument);
        assert_eq!(items[0].parameters.len(), 1);
        assert_eq!(items[0].parameters[0].name, "limit");
    }

    #[test]
    fn test_spec_never_overridden_by_fuzz() {
        let mut set = EndpointSet::new();
        let declared = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::SpecDocument);
        let fuzzed = Endpoint::new(Protocol::Rest, HttpMethod::Get, "/api/users", DiscoverySource::PathFuzz)
            .with_parameters(ParameterSpec::fallback_list());
        set.insert(declared);
        set.insert(fuzzed);

        let items = set.into_vec();
        assert_eq!(items[0].source, DiscoverySource::SpecDocument);
        assert!(items[0].parameters.is_empty());
    }

    #[test]
    fn test_identifier_params() {
        let ep = Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api/users/{id}",
            DiscoverySource::SpecDocument,
        );
        assert_eq!(ep.identifier_params().len(), 1);
    }
}
