// src/harvest/mod.rs
//! Harvest orchestration: quota allocation across source adapters,
//! concurrent fetching under per-adapter timeouts and a global deadline,
//! and one redistribution round when an adapter fails or under-delivers.

pub mod adapters;
pub mod cache;
pub mod quota;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::HarvestConfig;
use crate::harvest::adapters::{FetchError, SourceAdapter};
use crate::harvest::retry::RetryPolicy;
use crate::model::{CandidateItem, SourceReport};

static METRICS_DESCRIBED: OnceCell<()> = OnceCell::new();

fn ensure_metrics_described() {
    METRICS_DESCRIBED.get_or_init(|| {
        describe_counter!(
            "harvest_fetched_total",
            "Candidate items fetched from an origin before validation"
        );
        describe_counter!(
            "harvest_accepted_total",
            "Items accepted into the catalog per origin category"
        );
        describe_counter!(
            "harvest_duplicate_total",
            "Items rejected as duplicates per origin category"
        );
        describe_counter!(
            "harvest_malformed_total",
            "Items rejected as malformed per origin category"
        );
        describe_counter!(
            "harvest_adapter_failures_total",
            "Adapter fetches that exhausted their retry budget"
        );
        describe_histogram!("harvest_fetch_ms", "Wall time of one adapter fetch round");
        describe_histogram!("harvest_parse_ms", "Wall time of one response parse");
        describe_gauge!("harvest_last_run_ts", "Unix time of the last harvest run");
    });
}

/// Outcome of one harvest run before validation and dedup: merged items in
/// adapter priority order plus per-adapter accounting.
#[derive(Debug)]
pub struct HarvestBatch {
    pub items: Vec<CandidateItem>,
    pub reports: Vec<SourceReport>,
}

enum FetchOutcome {
    Fetched(Vec<CandidateItem>),
    Failed { reason: String },
}

pub struct Harvester {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    per_adapter_timeout: Duration,
    retry: RetryPolicy,
    global_deadline: Duration,
}

impl Harvester {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, cfg: &HarvestConfig) -> Self {
        Self {
            adapters,
            per_adapter_timeout: Duration::from_secs(cfg.per_adapter_timeout_secs),
            retry: RetryPolicy::new(
                cfg.retry_attempts,
                Duration::from_millis(cfg.retry_base_delay_ms),
            ),
            global_deadline: Duration::from_secs(cfg.global_deadline_secs),
        }
    }

    /// Run one harvest toward `target` items. Adapter failure never fails
    /// the run; it shows up in that adapter's report instead.
    pub async fn run(&self, target: usize) -> HarvestBatch {
        ensure_metrics_described();
        let deadline = Instant::now() + self.global_deadline;
        let quotas = quota::allocate(target, self.adapters.len());

        tracing::info!(target, adapters = self.adapters.len(), "harvest run started");

        let mut outcomes = self.fetch_round(&quotas, deadline).await;

        // One redistribution round: shortfall from failed or short adapters
        // goes to adapters that delivered their full quota.
        let mut fetched: Vec<usize> = Vec::with_capacity(quotas.len());
        let mut eligible: Vec<bool> = Vec::with_capacity(quotas.len());
        for (i, outcome) in outcomes.iter().enumerate() {
            match outcome {
                FetchOutcome::Fetched(items) => {
                    fetched.push(items.len().min(quotas[i]));
                    eligible.push(items.len() >= quotas[i] && quotas[i] > 0);
                }
                FetchOutcome::Failed { .. } => {
                    fetched.push(0);
                    eligible.push(false);
                }
            }
        }
        let shortfall: usize = quotas
            .iter()
            .zip(&fetched)
            .map(|(&q, &f)| q.saturating_sub(f))
            .sum();
        let extras = quota::redistribute(shortfall, &quotas, &eligible);

        if shortfall > 0 && extras.iter().any(|&e| e > 0) {
            tracing::info!(shortfall, "redistributing shortfall to healthy adapters");
            let second = self.fetch_round(&extras, deadline).await;
            for (i, outcome) in second.into_iter().enumerate() {
                if extras[i] == 0 {
                    continue;
                }
                if let (FetchOutcome::Fetched(items), FetchOutcome::Fetched(more)) =
                    (&mut outcomes[i], outcome)
                {
                    let take = extras[i].min(more.len());
                    items.extend(more.into_iter().take(take));
                }
            }
        }

        let mut merged = Vec::new();
        let mut reports = Vec::with_capacity(self.adapters.len());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let origin = self.adapters[i].name().to_string();
            let requested = quotas[i] + extras[i];
            match outcome {
                FetchOutcome::Fetched(mut items) => {
                    items.truncate(requested);
                    reports.push(SourceReport {
                        origin,
                        requested,
                        fetched: items.len(),
                        ..SourceReport::default()
                    });
                    merged.extend(items);
                }
                FetchOutcome::Failed { reason } => {
                    counter!("harvest_adapter_failures_total", "origin" => self.adapters[i].name())
                        .increment(1);
                    tracing::warn!(origin = %origin, reason = %reason, "adapter failed for the run");
                    reports.push(SourceReport {
                        origin,
                        requested,
                        reason: Some(reason),
                        ..SourceReport::default()
                    });
                }
            }
        }

        gauge!("harvest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        HarvestBatch {
            items: merged,
            reports,
        }
    }

    /// Fetch from every adapter concurrently. `FetchOutcome`s come back in
    /// adapter order regardless of completion order.
    async fn fetch_round(&self, quotas: &[usize], deadline: Instant) -> Vec<FetchOutcome> {
        let mut set = JoinSet::new();
        for (i, adapter) in self.adapters.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let quota = quotas[i];
            let timeout = self.per_adapter_timeout;
            let retry = self.retry;
            set.spawn(async move {
                if quota == 0 {
                    return (i, FetchOutcome::Fetched(Vec::new()));
                }
                let outcome = fetch_with_retry(adapter, quota, deadline, timeout, retry).await;
                (i, outcome)
            });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> =
            (0..self.adapters.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, outcome)) => outcomes[i] = Some(outcome),
                Err(e) => {
                    tracing::warn!(error = %e, "adapter task panicked");
                }
            }
        }
        outcomes
            .into_iter()
            .map(|o| {
                o.unwrap_or(FetchOutcome::Failed {
                    reason: "adapter task aborted".to_string(),
                })
            })
            .collect()
    }
}

async fn fetch_with_retry(
    adapter: Arc<dyn SourceAdapter>,
    quota: usize,
    deadline: Instant,
    per_attempt_timeout: Duration,
    retry: RetryPolicy,
) -> FetchOutcome {
    let t0 = Instant::now();
    let mut last_reason = String::new();

    for attempt in 0..retry.attempts {
        let backoff = retry.delay_before(attempt);
        if !backoff.is_zero() {
            tokio::time::sleep(backoff).await;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            last_reason = "global deadline elapsed".to_string();
            break;
        }

        let attempt_budget = per_attempt_timeout.min(remaining);
        match tokio::time::timeout(attempt_budget, adapter.fetch(quota, deadline)).await {
            Ok(Ok(items)) => {
                let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                histogram!("harvest_fetch_ms", "origin" => adapter.name()).record(ms);
                return FetchOutcome::Fetched(items);
            }
            Ok(Err(FetchError::RateLimited)) => {
                last_reason = "rate limited".to_string();
                tracing::warn!(origin = adapter.name(), attempt, "rate limited, backing off");
            }
            Ok(Err(FetchError::Unavailable(e))) => {
                last_reason = format!("source unavailable: {e:#}");
                tracing::warn!(origin = adapter.name(), attempt, error = %e, "fetch failed");
            }
            Err(_) => {
                last_reason = format!("timed out after {}ms", attempt_budget.as_millis());
                tracing::warn!(origin = adapter.name(), attempt, "fetch attempt timed out");
            }
        }
    }

    FetchOutcome::Failed {
        reason: last_reason,
    }
}
