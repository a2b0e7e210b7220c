use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::adapter::{GraphQlAdapter, ProtocolAdapter, RestAdapter, SoapAdapter};
use crate::config::{ProtocolSelection, ScanContext};
use crate::discovery::Discovery;
use crate::errors::ScanError;
use crate::http::HttpClient;
use crate::models::{
    Endpoint, FindingLog, Inconclusive, Protocol, ScanSession, SessionNote,
};
use crate::probes::{registry, Probe, ProbeCx, ProbeOutcome};
use crate::risk::{mean_score, RiskBucket};

use super::baseline;

/// Session orchestrator. Discovery closes the endpoint set, baselines are
/// measured once per endpoint, then every (endpoint, probe) pair runs as an
/// independent work item under one concurrency semaphore. The session ends
/// either complete or truncated, never empty-handed.
pub struct Scanner {
    ctx: Arc<ScanContext>,
    semaphore: Arc<Semaphore>,
    verbose: bool,
}

impl Scanner {
    pub fn new(ctx: ScanContext, verbose: bool) -> Self {
        let semaphore = Arc::new(Semaphore::new(ctx.concurrency));
        Self {
            ctx: Arc::new(ctx),
            semaphore,
            verbose,
        }
    }

    pub async fn run(&self, protocols: ProtocolSelection) -> Result<ScanSession> {
        let started_at = Utc::now();
        let transport = Arc::new(HttpClient::new(
            self.ctx.request_timeout,
            self.ctx.cancel.clone(),
        )?);

        // The deadline covers discovery, baselining and probing alike.
        // Firing it cancels the shared token, which every in-flight
        // transport call is already racing against.
        let deadline_hit = Arc::new(AtomicBool::new(false));
        let deadline = {
            let cancel = self.ctx.cancel.clone();
            let deadline_hit = Arc::clone(&deadline_hit);
            let session_timeout = self.ctx.session_timeout;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(session_timeout) => {
                        deadline_hit.store(true, Ordering::SeqCst);
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            })
        };

        let discovery = Discovery::new(Arc::clone(&transport), Arc::clone(&self.ctx));
        let (endpoint_set, discovery_findings, discovery_notes) =
            discovery.run(protocols).await;
        let endpoints = endpoint_set.into_vec();

        let log = Arc::new(FindingLog::new());
        log.extend_findings(discovery_findings);
        for note in discovery_notes {
            log.push_note(note);
        }

        let adapters = self.build_adapters(Arc::clone(&transport));
        let probes = registry();

        if !endpoints.is_empty() && !self.ctx.cancel.is_cancelled() {
            let baselines = self.measure_baselines(&endpoints, &adapters).await;
            self.run_probes(&endpoints, &adapters, &probes, &baselines, &log)
                .await;
        }

        deadline.abort();
        let mut truncated = self.ctx.cancel.is_cancelled();
        if truncated {
            let message = if deadline_hit.load(Ordering::SeqCst) {
                "Session deadline reached; results below are partial"
            } else {
                "Scan cancelled; results below are partial"
            };
            log.push_note(SessionNote::new("scanner", message));
        }

        let (findings, inconclusive, mut notes) = log.drain();

        // A finding pointing outside the closed endpoint set means the log
        // was corrupted; keep the data and mark the session incomplete.
        let consistent = findings
            .iter()
            .all(|f| endpoints.iter().any(|e| e.id() == f.endpoint));
        if !consistent {
            truncated = true;
            notes.push(SessionNote::new(
                "aggregator",
                ScanError::Aggregation(
                    "finding references an endpoint outside the session".to_string(),
                )
                .to_string(),
            ));
        }

        let overall_risk = RiskBucket::from_mean_score(mean_score(&endpoints, &findings));

        Ok(ScanSession {
            target: self.ctx.base_url.clone(),
            endpoints,
            findings,
            inconclusive,
            notes,
            started_at,
            completed_at: Utc::now(),
            truncated,
            overall_risk,
        })
    }

    fn build_adapters(
        &self,
        transport: Arc<HttpClient>,
    ) -> HashMap<Protocol, Arc<dyn ProtocolAdapter>> {
        let mut adapters: HashMap<Protocol, Arc<dyn ProtocolAdapter>> = HashMap::new();
        adapters.insert(
            Protocol::Rest,
            Arc::new(RestAdapter::new(Arc::clone(&transport), Arc::clone(&self.ctx))),
        );
        adapters.insert(
            Protocol::GraphQl,
            Arc::new(GraphQlAdapter::new(Arc::clone(&transport), Arc::clone(&self.ctx))),
        );
        adapters.insert(
            Protocol::Soap,
            Arc::new(SoapAdapter::new(transport, Arc::clone(&self.ctx))),
        );
        adapters
    }

    async fn measure_baselines(
        &self,
        endpoints: &[Endpoint],
        adapters: &HashMap<Protocol, Arc<dyn ProtocolAdapter>>,
    ) -> HashMap<crate::models::EndpointId, u64> {
        let futures: Vec<_> = endpoints
            .iter()
            .map(|endpoint| {
                let adapter = Arc::clone(&adapters[&endpoint.protocol]);
                let semaphore = Arc::clone(&self.semaphore);
                let ctx = Arc::clone(&self.ctx);
                async move {
                    let _permit = semaphore.acquire().await.expect("Semaphore closed");
                    let ms = baseline::measure(endpoint, adapter.as_ref(), &ctx).await;
                    (endpoint.id(), ms)
                }
            })
            .collect();
        join_all(futures).await.into_iter().collect()
    }

    async fn run_probes(
        &self,
        endpoints: &[Endpoint],
        adapters: &HashMap<Protocol, Arc<dyn ProtocolAdapter>>,
        probes: &[Arc<dyn Probe>],
        baselines: &HashMap<crate::models::EndpointId, u64>,
        log: &Arc<FindingLog>,
    ) {
        let total = endpoints.len() * probes.len();
        let pb = self.create_progress_bar(total);

        let futures: Vec<_> = endpoints
            .iter()
            .flat_map(|endpoint| {
                probes.iter().map(move |probe| (endpoint, Arc::clone(probe)))
            })
            .map(|(endpoint, probe)| {
                let adapter = Arc::clone(&adapters[&endpoint.protocol]);
                let baseline_ms = baselines
                    .get(&endpoint.id())
                    .copied()
                    .unwrap_or(baseline::BASELINE_UNMEASURED);
                let semaphore = Arc::clone(&self.semaphore);
                let ctx = Arc::clone(&self.ctx);
                let log = Arc::clone(log);
                let pb = pb.clone();
                async move {
                    let _permit = semaphore.acquire().await.expect("Semaphore closed");
                    if ctx.cancel.is_cancelled() {
                        return;
                    }
                    pb.set_message(format!("{} {}", probe.name(), endpoint.path));
                    let cx = ProbeCx {
                        ctx: &ctx,
                        adapter: adapter.as_ref(),
                        baseline_ms,
                    };
                    match probe.run(endpoint, &cx).await {
                        ProbeOutcome::Findings(findings) => log.extend_findings(findings),
                        ProbeOutcome::Inconclusive(reason) => log.push_inconclusive(Inconclusive {
                            probe: probe.name().to_string(),
                            endpoint: endpoint.id(),
                            reason,
                        }),
                    }
                    pb.inc(1);
                }
            })
            .collect();

        join_all(futures).await;
        pb.finish_with_message("Probe phase complete");
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        if self.verbose {
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
        } else {
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
        }
        pb
    }
}
