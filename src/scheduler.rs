use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::checker::StockChecker;
use crate::models::{CheckRecord, WatchItem};
use crate::utils::error::Result;

pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

/// Pause between passes that found nothing due.
pub const IDLE_INTERVAL: Duration = Duration::from_secs(2);

/// Runs a single watch item end to end.
#[async_trait]
pub trait ItemRunner: Send + Sync {
    async fn run_item(&self, item: &WatchItem) -> Result<Vec<CheckRecord>>;
}

#[async_trait]
impl ItemRunner for StockChecker {
    async fn run_item(&self, item: &WatchItem) -> Result<Vec<CheckRecord>> {
        self.run_for_items(std::slice::from_ref(item)).await
    }
}

type JobKey = (String, String);

#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub retailer: String,
    pub item_key: String,
    pub label: String,
    #[serde(skip)]
    pub next_due: Option<Instant>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
}

impl JobInfo {
    fn new(item: &WatchItem) -> Self {
        Self {
            retailer: item.retailer.clone(),
            item_key: item.item_key(),
            label: item.label.clone(),
            next_due: None,
            last_run: None,
            run_count: 0,
            success_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.is_none_or(|due| now >= due)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub total_jobs: usize,
    pub completed_runs: u64,
    pub failed_runs: u64,
    pub uptime_seconds: u64,
}

/// Polls every watch item forever, each on its own jittered timer.
///
/// Items start due immediately. After a run, success or not, the item becomes
/// due again after `base * U[0.8, 1.2]`, so items drift apart instead of
/// hitting the retailers in lockstep.
pub struct ItemScheduler {
    runner: Arc<dyn ItemRunner>,
    items: Vec<WatchItem>,
    base_interval: Duration,
    jobs: HashMap<JobKey, JobInfo>,
    rng: StdRng,
    start_time: DateTime<Utc>,
}

impl ItemScheduler {
    pub fn new(runner: Arc<dyn ItemRunner>, items: Vec<WatchItem>, base_interval: Duration) -> Self {
        Self::with_rng(runner, items, base_interval, StdRng::from_os_rng())
    }

    pub fn with_rng(runner: Arc<dyn ItemRunner>, items: Vec<WatchItem>, base_interval: Duration, rng: StdRng) -> Self {
        let mut jobs = HashMap::new();
        for item in &items {
            jobs.entry(job_key(item)).or_insert_with(|| JobInfo::new(item));
        }

        Self {
            runner,
            items,
            base_interval,
            jobs,
            rng,
            start_time: Utc::now(),
        }
    }

    /// One pass over the watchlist: run every item due at `now` and push its
    /// next due time out. Returns how many items ran.
    pub async fn tick(&mut self, now: Instant) -> usize {
        let mut ran = 0;

        for item in &self.items {
            let key = job_key(item);
            if !self.jobs.get(&key).is_none_or(|job| job.is_due(now)) {
                continue;
            }

            let result = self.runner.run_item(item).await;
            let factor = jitter_factor(&mut self.rng);
            let job = self.jobs.entry(key).or_insert_with(|| JobInfo::new(item));

            job.run_count += 1;
            job.last_run = Some(Utc::now());
            match result {
                Ok(records) => {
                    job.success_count += 1;
                    job.last_error = None;
                    tracing::debug!(retailer = %item.retailer, item = %item.label, records = records.len(), "Scheduled run finished");
                }
                Err(e) => {
                    job.error_count += 1;
                    job.last_error = Some(e.to_string());
                    tracing::error!(retailer = %item.retailer, item = %item.label, error = %e, "Scheduled run failed");
                }
            }

            let delay = self.base_interval.mul_f64(factor);
            job.next_due = Some(now + delay);
            tracing::debug!(item = %item.label, next_in_secs = delay.as_secs_f64(), "Rescheduled");
            ran += 1;
        }

        ran
    }

    /// Keep ticking until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(items = self.items.len(), base_secs = self.base_interval.as_secs(), "Scheduler started");

        loop {
            let ran = tokio::select! {
                _ = &mut shutdown => break,
                ran = self.tick(Instant::now()) => ran,
            };

            if ran == 0 {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(IDLE_INTERVAL) => {}
                }
            }
        }

        let stats = self.stats();
        tracing::info!(
            completed_runs = stats.completed_runs,
            failed_runs = stats.failed_runs,
            uptime_seconds = stats.uptime_seconds,
            "Scheduler stopped"
        );
    }

    pub async fn run_forever(&mut self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Job bookkeeping in watchlist order
    pub fn jobs(&self) -> Vec<&JobInfo> {
        let mut seen = std::collections::HashSet::new();
        self.items
            .iter()
            .map(job_key)
            .filter(|key| seen.insert(key.clone()))
            .filter_map(|key| self.jobs.get(&key))
            .collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            total_jobs: self.jobs.len(),
            completed_runs: self.jobs.values().map(|j| j.success_count).sum(),
            failed_runs: self.jobs.values().map(|j| j.error_count).sum(),
            uptime_seconds: (Utc::now() - self.start_time).num_seconds().max(0) as u64,
        }
    }
}

fn job_key(item: &WatchItem) -> JobKey {
    (item.retailer.clone(), item.item_key())
}

/// Random multiplier in `[JITTER_MIN, JITTER_MAX]`.
pub fn jitter_factor<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(JITTER_MIN..=JITTER_MAX)
}
