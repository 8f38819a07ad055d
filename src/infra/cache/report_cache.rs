use std::time::{Duration, Instant};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub report_kind: String,
    pub interval_range: String,
    pub agent_id: Option<i64>,
}

impl CacheKey {
    pub fn new(report_kind: &str, interval_range: &str, agent_id: Option<i64>) -> Self {
        Self {
            report_kind: report_kind.to_string(),
            interval_range: interval_range.to_string(),
            agent_id,
        }
    }
}

struct Entry {
    value: Value,
    stored_at: Instant,
}

/// In-process report cache with a fixed time-to-live per entry.
pub struct ReportCache {
    entries: DashMap<CacheKey, Entry>,
    ttl: Duration,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let hit = self.entries.get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone());

        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        }
        debug!(report = %key.report_kind, hit = hit.is_some(), "Report cache lookup");
        hit
    }

    pub fn put(&self, key: CacheKey, value: Value) {
        self.entries.insert(key, Entry { value, stored_at: Instant::now() });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
