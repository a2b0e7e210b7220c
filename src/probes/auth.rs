use async_trait::async_trait;
use regex::Regex;

use crate::adapter::ProbeRequest;
use crate::http::ProbeResult;
use crate::models::{CredentialTier, Endpoint, Finding, FindingKind, HttpMethod};

use super::{Probe, ProbeCx, ProbeOutcome};

/// Requests the endpoint with no credentials at all. A 2xx on a path the
/// operator did not declare public means the endpoint is unprotected.
pub struct MissingAuthProbe;

#[async_trait]
impl Probe for MissingAuthProbe {
    fn name(&self) -> &'static str {
        "missing-auth"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        if cx.ctx.is_public_path(&endpoint.path) {
            return ProbeOutcome::clean();
        }
        let result = cx.adapter.send(endpoint, &ProbeRequest::anonymous()).await;
        if result.is_transport_error() {
            return ProbeOutcome::Inconclusive(format!(
                "anonymous request failed: {}",
                result.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
            ));
        }
        if result.is_success() {
            return ProbeOutcome::one(Finding::high(
                FindingKind::MissingAuthentication,
                endpoint.id(),
                format!("Unauthenticated request returned HTTP {}", result.status),
            ));
        }
        ProbeOutcome::clean()
    }
}

/// Accesses another user's resource by mutating identifier parameters while
/// authenticated as a normal user. Needs a normal-tier credential and at
/// least one identifier-shaped parameter to act on.
pub struct HorizontalEscalationProbe;

/// Derive a neighbouring identifier value: numeric ids step by one, UUIDs
/// flip the final digit, opaque strings get a suffix.
pub fn substitute_identifier(value: &str) -> String {
    if let Ok(n) = value.parse::<u64>() {
        return (n + 1).to_string();
    }
    if value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4 {
        let mut chars: Vec<char> = value.chars().collect();
        let last = chars[35];
        chars[35] = if last == '1' { '2' } else { '1' };
        return chars.into_iter().collect();
    }
    format!("{}2", value)
}

/// Both requests answered, the mutated one was neither rejected nor
/// missing, and the server handed back a different resource.
pub fn cross_access_detected(own: &ProbeResult, other: &ProbeResult) -> bool {
    own.is_success()
        && other.is_success()
        && other.status != 403
        && other.status != 404
        && own.body != other.body
        && !other.body.is_empty()
}

#[async_trait]
impl Probe for HorizontalEscalationProbe {
    fn name(&self) -> &'static str {
        "horizontal-escalation"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        if cx.ctx.credentials.normal.token.is_none() {
            return ProbeOutcome::clean();
        }
        let identifiers = endpoint.identifier_params();
        if identifiers.is_empty() {
            return ProbeOutcome::clean();
        }

        for param in identifiers {
            let own_value = param.default_value();
            let own = cx
                .adapter
                .send(
                    endpoint,
                    &ProbeRequest::for_tier(CredentialTier::Normal)
                        .with_param(&param.name, &own_value),
                )
                .await;
            if own.is_transport_error() {
                return ProbeOutcome::Inconclusive("own-resource request failed".to_string());
            }

            let other_value = substitute_identifier(&own_value);
            let other = cx
                .adapter
                .send(
                    endpoint,
                    &ProbeRequest::for_tier(CredentialTier::Normal)
                        .with_param(&param.name, &other_value),
                )
                .await;
            if other.is_transport_error() {
                return ProbeOutcome::Inconclusive("cross-resource request failed".to_string());
            }

            if cross_access_detected(&own, &other) {
                return ProbeOutcome::one(Finding::high(
                    FindingKind::HorizontalPrivilegeEscalation,
                    endpoint.id(),
                    format!(
                        "Parameter '{}' value {} returned a different resource (HTTP {}) to a normal user",
                        param.name, other_value, other.status
                    ),
                ));
            }
        }
        ProbeOutcome::clean()
    }
}

/// Calls administrative-looking operations as a normal-tier user. The
/// surface lexicon is deliberately narrow so ordinary CRUD endpoints never
/// qualify. Compiled once at registry construction.
pub struct VerticalEscalationProbe {
    lexicon: Regex,
}

impl VerticalEscalationProbe {
    pub fn new() -> Self {
        // `delete` takes no trailing boundary: operation-style surfaces
        // such as Mutation.deleteUser or a DeleteUser WSDL operation put a
        // word character right after the verb.
        let lexicon =
            Regex::new(r"(?i)(\b(admin|config|system|role|permission|internal)s?\b|\bdelete)")
                .expect("invalid lexicon pattern");
        Self { lexicon }
    }

    pub fn is_privileged_surface(&self, path: &str, method: HttpMethod) -> bool {
        self.lexicon.is_match(path) || method == HttpMethod::Delete
    }
}

impl Default for VerticalEscalationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for VerticalEscalationProbe {
    fn name(&self) -> &'static str {
        "vertical-escalation"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        if cx.ctx.credentials.normal.token.is_none() {
            return ProbeOutcome::clean();
        }
        if !self.is_privileged_surface(&endpoint.path, endpoint.method) {
            return ProbeOutcome::clean();
        }

        let result = cx
            .adapter
            .send(endpoint, &ProbeRequest::for_tier(CredentialTier::Normal))
            .await;
        if result.is_transport_error() {
            return ProbeOutcome::Inconclusive("privileged-surface request failed".to_string());
        }
        if result.is_success() {
            return ProbeOutcome::one(Finding::critical(
                FindingKind::VerticalPrivilegeEscalation,
                endpoint.id(),
                format!(
                    "Normal-tier credential executed {} {} (HTTP {})",
                    endpoint.method, endpoint.path, result.status
                ),
            ));
        }
        ProbeOutcome::clean()
    }
}
