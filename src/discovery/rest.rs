use std::collections::HashMap;

use super::DiscoveryOutcome;
use super::openapi::OpenApiParser;
use crate::config::ScanContext;
use crate::http::HttpClient;
use crate::models::{
    DiscoverySource, Endpoint, HttpMethod, ParameterSpec, Protocol, SessionNote,
};

/// Well-known locations for machine-readable spec documents. A parsed spec
/// is authoritative and skips the heuristic passes entirely.
const SPEC_PATHS: &[&str] = &[
    "/openapi.json",
    "/swagger.json",
    "/v3/api-docs",
    "/api-docs",
    "/swagger/v1/swagger.json",
    "/openapi/v3.json",
];

/// Conventional API paths checked when no spec document exists.
const COMMON_PATHS: &[&str] = &[
    "/api/users",
    "/api/users/{id}",
    "/api/user",
    "/api/accounts",
    "/api/accounts/{id}",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/auth/register",
    "/api/token",
    "/api/products",
    "/api/products/{id}",
    "/api/orders",
    "/api/orders/{id}",
    "/api/items",
    "/api/search",
    "/api/admin",
    "/api/admin/users",
    "/api/config",
    "/api/settings",
    "/api/status",
    "/api/health",
    "/api/version",
    "/api/files",
    "/api/upload",
    "/api/reports",
    "/api/v1/users",
    "/api/v1/users/{id}",
    "/api/v2/users",
    "/users",
    "/admin",
];

/// Bounded wordlist for the final fuzz pass, applied under `/api/`.
const FUZZ_WORDS: &[&str] = &[
    "account", "analytics", "audit", "backup", "billing", "cart", "categories", "comments",
    "customers", "dashboard", "debug", "devices", "docs", "events", "export", "groups", "info",
    "internal", "invoices", "jobs", "keys", "logs", "messages", "metrics", "notifications",
    "payments", "permissions", "profile", "roles", "sessions", "stats", "tasks", "teams",
    "tokens", "webhooks",
];

pub async fn discover(transport: &HttpClient, ctx: &ScanContext) -> DiscoveryOutcome {
    let mut outcome = DiscoveryOutcome::default();

    for spec_path in SPEC_PATHS {
        if ctx.cancel.is_cancelled() {
            return outcome;
        }
        let url = ctx.url_for(spec_path);
        let headers = vec![("Accept".to_string(), "application/json".to_string())];
        let result = transport.send(HttpMethod::Get, &url, &headers, None).await;
        if !result.is_success() {
            continue;
        }
        match OpenApiParser::new().parse_content(&result.body) {
            Ok(endpoints) if !endpoints.is_empty() => {
                outcome.notes.push(SessionNote::new(
                    "discovery/rest",
                    format!("parsed spec document at {} ({} operations)", spec_path, endpoints.len()),
                ));
                outcome.endpoints = endpoints;
                return outcome;
            }
            Ok(_) => {}
            Err(e) => {
                outcome.notes.push(SessionNote::new(
                    "discovery/rest",
                    format!("spec document at {} unparsable: {}", spec_path, e),
                ));
            }
        }
    }

    common_path_pass(transport, ctx, &mut outcome).await;
    fuzz_pass(transport, ctx, &mut outcome).await;

    if outcome.endpoints.is_empty() {
        outcome.notes.push(SessionNote::new(
            "discovery/rest",
            "no REST endpoints discovered",
        ));
    }
    outcome
}

async fn common_path_pass(transport: &HttpClient, ctx: &ScanContext, outcome: &mut DiscoveryOutcome) {
    for path in COMMON_PATHS {
        if ctx.cancel.is_cancelled() {
            return;
        }
        let candidate = Endpoint::new(Protocol::Rest, HttpMethod::Get, path, DiscoverySource::CommonPath);
        let probe_url = ctx.url_for(&candidate.resolve_path(&HashMap::new()));

        let options = transport.send(HttpMethod::Options, &probe_url, &[], None).await;
        if let Some(allow) = options.header("allow") {
            let allow = allow.to_string();
            for method in allow.split(',').filter_map(|m| HttpMethod::parse(m.trim())) {
                if matches!(method, HttpMethod::Head | HttpMethod::Options) {
                    continue;
                }
                outcome.endpoints.push(
                    Endpoint::new(Protocol::Rest, method, path, DiscoverySource::CommonPath)
                        .with_generic_params(),
                );
            }
            continue;
        }

        let get = transport.send(HttpMethod::Get, &probe_url, &[], None).await;
        if path_exists(get.status) {
            outcome.endpoints.push(candidate.with_generic_params());
        }
    }
}

async fn fuzz_pass(transport: &HttpClient, ctx: &ScanContext, outcome: &mut DiscoveryOutcome) {
    for word in FUZZ_WORDS {
        if ctx.cancel.is_cancelled() {
            return;
        }
        let path = format!("/api/{}", word);
        let result = transport.send(HttpMethod::Get, &ctx.url_for(&path), &[], None).await;
        if path_exists(result.status) {
            outcome.endpoints.push(
                Endpoint::new(Protocol::Rest, HttpMethod::Get, &path, DiscoverySource::PathFuzz)
                    .with_generic_params(),
            );
        }
    }
}

/// A path counts as existing when the server answers anything but 404 or a
/// transport failure; 401/403/405 still prove presence.
fn path_exists(status: u16) -> bool {
    status != 0 && status != 404 && status < 500
}

trait GenericParams {
    fn with_generic_params(self) -> Endpoint;
}

impl GenericParams for Endpoint {
    /// Endpoints without a spec document get the generic fallback parameter
    /// list, on top of any inferred path params, so probes have inputs to
    /// mutate.
    fn with_generic_params(mut self) -> Endpoint {
        let mut params = ParameterSpec::fallback_list();
        params.retain(|fallback| !self.parameters.iter().any(|p| p.name == fallback.name));
        self.parameters.extend(params);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_exists_classification() {
        assert!(path_exists(200));
        assert!(path_exists(401));
        assert!(path_exists(403));
        assert!(!path_exists(404));
        assert!(!path_exists(500));
        assert!(!path_exists(0));
    }

    #[test]
    fn test_generic_params_do_not_shadow_path_params() {
        let ep = Endpoint::new(
            Protocol::Rest,
            HttpMethod::Get,
            "/api/users/{id}",
            DiscoverySource::CommonPath,
        )
        .with_generic_params();
        let id_params: Vec<_> = ep.parameters.iter().filter(|p| p.name == "id").collect();
        assert_eq!(id_params.len(), 1);
        assert_eq!(id_params[0].location, crate::models::ParamLocation::Path);
    }
}
