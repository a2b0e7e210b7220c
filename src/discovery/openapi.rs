use serde_json::Value;

use crate::errors::ScanError;
use crate::models::{
    DiscoverySource, Endpoint, HttpMethod, ParamLocation, ParamType, ParameterSpec, Protocol,
};

/// Parses OpenAPI 3.x and Swagger 2.0 documents into endpoints with full
/// parameter specs. Spec-sourced endpoints are authoritative for the whole
/// session.
pub struct OpenApiParser;

impl OpenApiParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_content(&self, content: &str) -> Result<Vec<Endpoint>, ScanError> {
        let spec: Value = serde_json::from_str(content)
            .map_err(|e| ScanError::Discovery(format!("spec document is not valid JSON: {}", e)))?;

        match self.detect_version(&spec) {
            OpenApiVersion::V3 => self.parse_paths(&spec, SchemaStyle::V3),
            OpenApiVersion::V2 => self.parse_paths(&spec, SchemaStyle::V2),
            OpenApiVersion::Unknown => Err(ScanError::Discovery(
                "unknown OpenAPI/Swagger version".to_string(),
            )),
        }
    }

    fn detect_version(&self, spec: &Value) -> OpenApiVersion {
        if spec.get("openapi").is_some() {
            OpenApiVersion::V3
        } else if spec.get("swagger").is_some() {
            OpenApiVersion::V2
        } else {
            OpenApiVersion::Unknown
        }
    }

    fn parse_paths(&self, spec: &Value, style: SchemaStyle) -> Result<Vec<Endpoint>, ScanError> {
        let paths = spec
            .get("paths")
            .and_then(|p| p.as_object())
            .ok_or_else(|| ScanError::Discovery("no 'paths' found in spec document".to_string()))?;

        let mut endpoints = Vec::new();

        for (path, methods) in paths {
            let methods_obj = match methods.as_object() {
                Some(m) => m,
                None => continue,
            };

            for (method_str, operation) in methods_obj {
                let Some(method) = HttpMethod::parse(method_str) else {
                    continue;
                };

                let mut parameters = Vec::new();
                if let Some(params) = operation.get("parameters").and_then(|p| p.as_array()) {
                    parameters.extend(self.parse_parameters(params, style));
                }
                if style == SchemaStyle::V3 {
                    if let Some(request_body) = operation.get("requestBody") {
                        parameters.extend(self.parse_request_body(request_body));
                    }
                }

                let endpoint =
                    Endpoint::new(Protocol::Rest, method, path, DiscoverySource::SpecDocument);
                // Path params the document forgot to declare stay inferred
                // from the template; declared specs win per name.
                let mut merged = endpoint.parameters.clone();
                merged.retain(|inferred| !parameters.iter().any(|p| p.name == inferred.name));
                merged.extend(parameters);
                endpoints.push(endpoint.with_parameters(merged));
            }
        }

        Ok(endpoints)
    }

    fn parse_parameters(&self, params: &[Value], style: SchemaStyle) -> Vec<ParameterSpec> {
        let mut specs = Vec::new();

        for param in params {
            let name = match param.get("name").and_then(|v| v.as_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let location = match param.get("in").and_then(|v| v.as_str()) {
                Some("path") => ParamLocation::Path,
                Some("query") => ParamLocation::Query,
                Some("header") => ParamLocation::Header,
                Some("body") | Some("formData") => ParamLocation::Body,
                _ => continue,
            };
            let type_source = match style {
                SchemaStyle::V3 => param.get("schema"),
                SchemaStyle::V2 => Some(param),
            };
            let required = param
                .get("required")
                .and_then(|v| v.as_bool())
                .unwrap_or(location == ParamLocation::Path);

            specs.push(ParameterSpec {
                name,
                location,
                data_type: self.infer_type(type_source),
                required,
            });
        }

        specs
    }

    /// One Body parameter per declared JSON property, so injection probes
    /// can target each field individually.
    fn parse_request_body(&self, request_body: &Value) -> Vec<ParameterSpec> {
        let schema = request_body
            .get("content")
            .and_then(|c| c.get("application/json"))
            .and_then(|j| j.get("schema"));
        let Some(schema) = schema else {
            return vec![ParameterSpec::new("body", ParamLocation::Body, ParamType::String, true)];
        };

        let required_names: Vec<&str> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        match schema.get("properties").and_then(|p| p.as_object()) {
            Some(props) => props
                .iter()
                .map(|(name, prop)| ParameterSpec {
                    name: name.clone(),
                    location: ParamLocation::Body,
                    data_type: self.infer_type(Some(prop)),
                    required: required_names.contains(&name.as_str()),
                })
                .collect(),
            None => vec![ParameterSpec::new("body", ParamLocation::Body, ParamType::String, true)],
        }
    }

    fn infer_type(&self, schema: Option<&Value>) -> ParamType {
        let Some(schema) = schema else {
            return ParamType::String;
        };
        let type_str = schema.get("type").and_then(|v| v.as_str()).unwrap_or("");
        let format_str = schema.get("format").and_then(|v| v.as_str()).unwrap_or("");

        match (type_str, format_str) {
            ("integer", _) | ("number", _) => ParamType::Integer,
            ("string", "uuid") => ParamType::Uuid,
            ("boolean", _) => ParamType::Boolean,
            _ => ParamType::String,
        }
    }
}

impl Default for OpenApiParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaStyle {
    V3,
    V2,
}

enum OpenApiVersion {
    V3,
    V2,
    Unknown,
}
