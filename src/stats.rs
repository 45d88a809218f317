use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-run counters, bumped concurrently by pool workers.
#[derive(Debug, Default)]
pub struct RunStats {
    pub index_pages_fetched: AtomicUsize,
    pub index_pages_failed: AtomicUsize,
    pub listings_seen: AtomicUsize,
    pub listings_excluded: AtomicUsize,
    pub listings_malformed: AtomicUsize,
    pub listings_failed: AtomicUsize,
    pub records_built: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub index_pages_fetched: usize,
    pub index_pages_failed: usize,
    pub listings_seen: usize,
    pub listings_excluded: usize,
    pub listings_malformed: usize,
    pub listings_failed: usize,
    pub records_built: usize,
}

impl RunStats {
    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            index_pages_fetched: self.index_pages_fetched.load(Ordering::Relaxed),
            index_pages_failed: self.index_pages_failed.load(Ordering::Relaxed),
            listings_seen: self.listings_seen.load(Ordering::Relaxed),
            listings_excluded: self.listings_excluded.load(Ordering::Relaxed),
            listings_malformed: self.listings_malformed.load(Ordering::Relaxed),
            listings_failed: self.listings_failed.load(Ordering::Relaxed),
            records_built: self.records_built.load(Ordering::Relaxed),
        }
    }
}
