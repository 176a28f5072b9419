use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{self, Duration};
use tracing::info;

#[derive(Debug)]
pub struct StatsCollector {
    requests: AtomicU64,
    near_queries: AtomicU64,
    lookups: AtomicU64,
    not_found: AtomicU64,
    favorites_reads: AtomicU64,
    favorites_writes: AtomicU64,
    unauthorized: AtomicU64,
    storage_errors: AtomicU64,
    started_at: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub near_queries: u64,
    pub lookups: u64,
    pub not_found: u64,
    pub favorites_reads: u64,
    pub favorites_writes: u64,
    pub unauthorized: u64,
    pub storage_errors: u64,
    pub started_at: u64,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self {
            requests: AtomicU64::new(0),
            near_queries: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            favorites_reads: AtomicU64::new(0),
            favorites_writes: AtomicU64::new(0),
            unauthorized: AtomicU64::new(0),
            storage_errors: AtomicU64::new(0),
            started_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

impl StatsCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Spawns the periodic dump onto the current runtime.
    pub fn spawn_reporter(self: &Arc<Self>, interval_secs: u64) {
        if interval_secs == 0 {
            return;
        }
        let stats = self.clone();
        tokio::spawn(async move {
            stats.run_logger(Duration::from_secs(interval_secs)).await;
        });
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_near_queries(&self) {
        self.near_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lookups(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_favorites_reads(&self) {
        self.favorites_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_favorites_writes(&self) {
        self.favorites_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unauthorized(&self) {
        self.unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_storage_errors(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            near_queries: self.near_queries.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            favorites_reads: self.favorites_reads.load(Ordering::Relaxed),
            favorites_writes: self.favorites_writes.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            started_at: self.started_at,
        }
    }

    async fn run_logger(&self, period: Duration) {
        let mut interval = time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.dump_stats();
        }
    }

    fn dump_stats(&self) {
        let s = self.get_snapshot();
        let pct = |n: u64| {
            if s.requests > 0 {
                (n as f64 / s.requests as f64) * 100.0
            } else {
                0.0
            }
        };

        info!(
            "STATS DUMP: Requests: {}, Near: {} ({:.1}%), Lookups: {}, NotFound: {}, Favorites r/w: {}/{}, Unauthorized: {} ({:.1}%), StorageErrors: {}",
            s.requests,
            s.near_queries,
            pct(s.near_queries),
            s.lookups,
            s.not_found,
            s.favorites_reads,
            s.favorites_writes,
            s.unauthorized,
            pct(s.unauthorized),
            s.storage_errors
        );
    }
}
