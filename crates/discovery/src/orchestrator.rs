//! # Discovery Orchestrator
//!
//! Drives one discovery run from the change feed to the final result set:
//! 1. Fetch a page of candidate ids from the change feed
//! 2. Fan the page out to a bounded pool of workers
//! 3. Each worker resolves eligibility, runs the filter pipeline and
//!    appends survivors to the shared result set
//! 4. Join the workers, then decide whether to fetch another page
//!
//! ## Stop conditions
//! Checked in this order before every page fetch:
//! - the result set is full
//! - the page budget is spent
//!
//! and after every page:
//! - the page had no candidates (feed exhausted)
//! - the feed returned no cursor, or the same cursor again
//!
//! Workers stop claiming candidates as soon as the result set fills. A
//! candidate already in flight still finishes, but its result is dropped
//! if there is no room left.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use line_counter::TarballLineCounter;
use pipeline::{FilterPipeline, FilterSpec, LineCountFailurePolicy};
use registry::{Cursor, PackageInfo, RegistryApi};
use sources::{ChangeFeed, EligibilityResolver};

use crate::error::DiscoveryError;
use crate::work::{PageQueue, ResultSet};

/// Limits for a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Change entries requested per feed page
    pub page_size: usize,
    /// Stop once this many packages were accepted
    pub max_results: usize,
    /// Only packages first published within this many days qualify
    pub recency_window_days: u32,
    /// Upper bound on feed pages fetched
    pub max_pages: usize,
    /// Candidates evaluated at the same time; 0 is treated as 1
    pub concurrency: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_results: 50,
            recency_window_days: 7,
            max_pages: 10,
            concurrency: 8,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ResultsFull,
    FeedExhausted,
    PageBudgetReached,
    CursorStalled,
}

/// Outcome of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    /// Accepted packages, in acceptance order
    pub packages: Vec<PackageInfo>,
    pub pages_fetched: usize,
    /// Candidate ids taken from the feed, after per-page deduplication
    pub candidates_seen: usize,
    pub stop_reason: StopReason,
}

/// Everything a worker task needs, cloned once per worker
#[derive(Clone)]
struct WorkerContext {
    queue: Arc<PageQueue>,
    results: Arc<ResultSet>,
    resolver: EligibilityResolver,
    pipeline: Arc<FilterPipeline>,
    recency_window_days: u32,
    now: DateTime<Utc>,
}

/// Coordinates the change feed, eligibility checks and filter pipeline
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    feed: ChangeFeed,
    resolver: EligibilityResolver,
    pipeline: Arc<FilterPipeline>,
}

impl DiscoveryOrchestrator {
    /// Create an orchestrator around an already assembled pipeline.
    pub fn new(registry: Arc<dyn RegistryApi>, pipeline: FilterPipeline) -> Self {
        Self {
            feed: ChangeFeed::new(registry.clone()),
            resolver: EligibilityResolver::new(registry),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Create an orchestrator with the standard filter chain for `spec`.
    ///
    /// Line counts come from the registry's own distribution archives.
    pub fn from_spec(
        registry: Arc<dyn RegistryApi>,
        spec: &FilterSpec,
        failure_policy: LineCountFailurePolicy,
    ) -> Result<Self> {
        let counter = Arc::new(TarballLineCounter::new(registry.clone()));
        let pipeline = FilterPipeline::from_spec(spec, counter)
            .context("Failed to build filter pipeline")?
            .with_failure_policy(failure_policy);
        info!("Filters in order: {:?}", pipeline.filter_names());
        Ok(Self::new(registry, pipeline))
    }

    /// Run discovery until one of the stop conditions holds.
    ///
    /// # Arguments
    /// * `budget` - Page, result and concurrency limits
    /// * `now` - Reference time for the recency window
    ///
    /// # Errors
    /// Only a failed feed page or a crashed worker aborts the run. Packages
    /// accepted before a feed failure are discarded with it.
    #[instrument(skip_all, fields(max_results = budget.max_results, max_pages = budget.max_pages))]
    pub async fn discover(
        &self,
        budget: &Budget,
        now: DateTime<Utc>,
    ) -> Result<DiscoveryReport, DiscoveryError> {
        let start_time = Instant::now();
        let results = Arc::new(ResultSet::new(budget.max_results));
        let mut cursor: Option<Cursor> = None;
        let mut pages_fetched = 0;
        let mut candidates_seen = 0;

        let stop_reason = loop {
            if results.is_full() {
                break StopReason::ResultsFull;
            }
            if pages_fetched >= budget.max_pages {
                break StopReason::PageBudgetReached;
            }

            let page = self
                .feed
                .fetch_page(budget.page_size, cursor.as_ref())
                .await
                .map_err(DiscoveryError::FeedUnavailable)?;
            pages_fetched += 1;

            if page.ids.is_empty() {
                info!("Page {} is empty, feed exhausted", pages_fetched);
                break StopReason::FeedExhausted;
            }
            candidates_seen += page.ids.len();

            self.process_page(page.ids, budget, now, &results).await?;
            info!(
                "Processed page {}, {} of {} results collected",
                pages_fetched,
                results.len(),
                budget.max_results
            );

            match page.next_cursor {
                Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
                _ if results.is_full() => break StopReason::ResultsFull,
                _ => break StopReason::CursorStalled,
            }
        };

        let packages = results.take();
        info!(
            "Discovery finished ({:?}): {} packages from {} candidates over {} pages in {:.2?}",
            stop_reason,
            packages.len(),
            candidates_seen,
            pages_fetched,
            start_time.elapsed()
        );

        Ok(DiscoveryReport {
            packages,
            pages_fetched,
            candidates_seen,
            stop_reason,
        })
    }

    /// Evaluate one page with up to `budget.concurrency` workers.
    async fn process_page(
        &self,
        ids: Vec<String>,
        budget: &Budget,
        now: DateTime<Utc>,
        results: &Arc<ResultSet>,
    ) -> Result<(), DiscoveryError> {
        let queue = Arc::new(PageQueue::new(ids));
        let worker_count = budget.concurrency.max(1).min(queue.len());
        debug!("Spawning {} workers for {} candidates", worker_count, queue.len());

        let context = WorkerContext {
            queue,
            results: results.clone(),
            resolver: self.resolver.clone(),
            pipeline: self.pipeline.clone(),
            recency_window_days: budget.recency_window_days,
            now,
        };

        // Dropping the set aborts whatever is still running, so an early
        // return never leaves workers behind
        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            workers.spawn(run_worker(worker, context.clone()));
        }

        while let Some(joined) = workers.join_next().await {
            let accepted = joined.map_err(DiscoveryError::WorkerFailed)?;
            debug!("Worker accepted {} packages", accepted);
        }
        Ok(())
    }
}

/// Claim candidates until the page is drained or the result set is full.
///
/// Returns the number of packages this worker added.
async fn run_worker(worker: usize, context: WorkerContext) -> usize {
    let mut accepted = 0;

    while !context.results.is_full() {
        let Some(id) = context.queue.next() else {
            break;
        };

        let Some(mut package) = context
            .resolver
            .resolve(id, context.recency_window_days, context.now)
            .await
        else {
            continue;
        };

        if !context.pipeline.apply(&mut package).await {
            continue;
        }

        if context.results.push(package) {
            debug!("Worker {} accepted {}", worker, id);
            accepted += 1;
        } else {
            break;
        }
    }
    accepted
}
