use async_trait::async_trait;

use crate::adapter::ProbeRequest;
use crate::models::{Endpoint, Finding, FindingKind};

use super::{Probe, ProbeCx, ProbeOutcome};

/// Fires a short anonymous burst at the endpoint and checks whether any
/// response throttles it. No 429 (or rate-limit header) across the whole
/// burst means the endpoint accepts unbounded traffic.
pub struct RateLimitProbe;

/// The burst is judged as a whole: one 429 anywhere clears the endpoint.
pub fn burst_unthrottled(statuses: &[u16], saw_limit_header: bool) -> bool {
    !statuses.is_empty() && !statuses.contains(&429) && !saw_limit_header
}

#[async_trait]
impl Probe for RateLimitProbe {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    async fn run(&self, endpoint: &Endpoint, cx: &ProbeCx<'_>) -> ProbeOutcome {
        let burst = cx.ctx.rate_limit_burst;
        let mut statuses = Vec::with_capacity(burst);
        let mut saw_limit_header = false;
        let mut failed = 0usize;

        for _ in 0..burst {
            if cx.ctx.cancel.is_cancelled() {
                return ProbeOutcome::Inconclusive("cancelled mid-burst".to_string());
            }
            let result = cx.adapter.send(endpoint, &ProbeRequest::anonymous()).await;
            if result.is_transport_error() {
                failed += 1;
                continue;
            }
            if result.has_header("retry-after")
                || result.has_header("x-ratelimit-remaining")
                || result.has_header("ratelimit-remaining")
            {
                saw_limit_header = true;
            }
            statuses.push(result.status);
        }

        if statuses.is_empty() {
            return ProbeOutcome::Inconclusive(format!("all {} burst requests failed", failed));
        }
        if burst_unthrottled(&statuses, saw_limit_header) {
            return ProbeOutcome::one(Finding::medium(
                FindingKind::MissingRateLimit,
                endpoint.id(),
                format!(
                    "{} rapid requests all answered without throttling (no 429, no rate-limit headers)",
                    statuses.len()
                ),
            ));
        }
        ProbeOutcome::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unthrottled_burst_flagged() {
        let statuses = vec![200; 20];
        assert!(burst_unthrottled(&statuses, false));
    }

    #[test]
    fn test_single_429_clears_burst() {
        let mut statuses = vec![200; 19];
        statuses.push(429);
        assert!(!burst_unthrottled(&statuses, false));
    }

    #[test]
    fn test_rate_limit_header_clears_burst() {
        let statuses = vec![200; 20];
        assert!(!burst_unthrottled(&statuses, true));
    }

    #[test]
    fn test_empty_burst_is_not_a_verdict() {
        assert!(!burst_unthrottled(&[], false));
    }
}
