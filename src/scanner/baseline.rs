use crate::adapter::{ProbeRequest, ProtocolAdapter};
use crate::config::ScanContext;
use crate::models::{CredentialTier, Endpoint};

/// Sentinel baseline for endpoints that never answered during sampling.
/// Timing-based verdicts are suppressed for them.
pub const BASELINE_UNMEASURED: u64 = u64::MAX;

pub fn median(samples: &mut Vec<u64>) -> Option<u64> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    Some(samples[samples.len() / 2])
}

/// Median latency over a few benign normal-tier requests. The median rather
/// than the mean so one congested sample cannot poison the baseline.
pub async fn measure(
    endpoint: &Endpoint,
    adapter: &dyn ProtocolAdapter,
    ctx: &ScanContext,
) -> u64 {
    let mut samples = Vec::with_capacity(ctx.baseline_samples);
    for _ in 0..ctx.baseline_samples {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let result = adapter
            .send(endpoint, &ProbeRequest::for_tier(CredentialTier::Normal))
            .await;
        if !result.is_transport_error() {
            samples.push(result.elapsed_ms);
        }
    }
    median(&mut samples).unwrap_or(BASELINE_UNMEASURED)
}
