//! A batch of candidates through the coordinator, bounded and unordered.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use futures::{StreamExt, future, stream};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::coordinator::{CandidateItem, IngestCoordinator};
use crate::verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub id: Uuid,
    pub counters: BTreeMap<Verdict, usize>,
    /// Domain -> items that ended in `error` or `rejected_no_body`.
    pub failed_sources: BTreeMap<String, usize>,
    /// Items never started because the cycle was cancelled.
    pub cancelled: usize,
    pub elapsed_ms: u64,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            counters: BTreeMap::new(),
            failed_sources: BTreeMap::new(),
            cancelled: 0,
            elapsed_ms: 0,
        }
    }

    fn record(&mut self, verdict: Verdict, domain: Option<String>) {
        *self.counters.entry(verdict).or_default() += 1;
        if verdict.is_source_failure() {
            let domain = domain.unwrap_or_else(|| "unknown".to_string());
            *self.failed_sources.entry(domain).or_default() += 1;
        }
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.counters.get(&verdict).copied().unwrap_or(0)
    }

    /// Items that received a verdict.
    pub fn total(&self) -> usize {
        self.counters.values().sum()
    }
}

pub async fn run_cycle(
    coordinator: &IngestCoordinator,
    items: Vec<CandidateItem>,
    cancel: &CancellationToken,
) -> CycleReport {
    run_cycle_at(coordinator, items, Utc::now(), cancel).await
}

/// [`run_cycle`] with an explicit "now" for the staleness window.
pub async fn run_cycle_at(
    coordinator: &IngestCoordinator,
    items: Vec<CandidateItem>,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> CycleReport {
    let started = Instant::now();
    let settings = coordinator.settings();
    let cutoff = now - Duration::days(settings.staleness_days.max(0));
    let mut report = CycleReport::new();

    let mut fresh = Vec::with_capacity(items.len());
    for item in items {
        match item.published_at {
            Some(at) if at < cutoff => {
                debug!(url = %item.url, published_at = %at, "ingest.stale");
                report.record(Verdict::RejectedStale, None);
            }
            _ => fresh.push(item),
        }
    }

    let queued = fresh.len();
    let results: Vec<(Option<String>, Verdict)> = stream::iter(fresh)
        .take_while(|_| future::ready(!cancel.is_cancelled()))
        .map(|item| async move {
            let verdict = coordinator.ingest(&item, cancel).await;
            (item.domain(), verdict)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    report.cancelled = queued - results.len();
    for (domain, verdict) in results {
        report.record(verdict, domain);
    }
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    info!(
        cycle = %report.id,
        total = report.total(),
        accepted = report.count(Verdict::Accepted),
        duplicate = report.count(Verdict::Duplicate),
        rejected = report.total() - report.count(Verdict::Accepted) - report.count(Verdict::Duplicate),
        cancelled = report.cancelled,
        failed_sources = ?report.failed_sources,
        elapsed_ms = report.elapsed_ms,
        "ingest.cycle.done"
    );
    report
}
