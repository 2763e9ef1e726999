// src/perf/mod.rs
// In-process latency tracking: a bounded ring buffer of per-request samples
// with percentile computation. Grounded in `cache/mod.rs`'s
// `parking_lot::Mutex`-guarded shared state idiom.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub total_ms: u64,
    pub embedding_ms: u64,
    pub retrieval_ms: u64,
    pub rerank_ms: u64,
    pub cache_hit: bool,
    pub rerank_applied: bool,
    pub stage_breakdown: Option<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Percentiles {
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PerformanceSnapshot {
    pub sample_count: usize,
    pub overall: Percentiles,
    pub cache_hit: Percentiles,
    pub cache_miss: Percentiles,
    pub cache_hit_rate: f64,
}

pub struct PerformanceTracker {
    capacity: usize,
    samples: Mutex<VecDeque<Sample>>,
}

impl PerformanceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, sample: Sample) {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return PerformanceSnapshot::default();
        }

        let all: Vec<u64> = samples.iter().map(|s| s.total_ms).collect();
        let hits: Vec<u64> = samples.iter().filter(|s| s.cache_hit).map(|s| s.total_ms).collect();
        let misses: Vec<u64> = samples.iter().filter(|s| !s.cache_hit).map(|s| s.total_ms).collect();

        PerformanceSnapshot {
            sample_count: samples.len(),
            overall: percentiles(&all),
            cache_hit: percentiles(&hits),
            cache_miss: percentiles(&misses),
            cache_hit_rate: hits.len() as f64 / samples.len() as f64,
        }
    }
}

fn percentiles(values: &[u64]) -> Percentiles {
    if values.is_empty() {
        return Percentiles::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Percentiles {
        p50: percentile_at(&sorted, 0.50),
        p90: percentile_at(&sorted, 0.90),
        p95: percentile_at(&sorted, 0.95),
        p99: percentile_at(&sorted, 0.99),
    }
}

fn percentile_at(sorted: &[u64], p: f64) -> u64 {
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(total_ms: u64, cache_hit: bool) -> Sample {
        Sample {
            total_ms,
            embedding_ms: 0,
            retrieval_ms: 0,
            rerank_ms: 0,
            cache_hit,
            rerank_applied: false,
            stage_breakdown: None,
        }
    }

    #[test]
    fn evicts_oldest_sample_past_capacity() {
        let tracker = PerformanceTracker::new(2);
        tracker.record(sample(10, false));
        tracker.record(sample(20, false));
        tracker.record(sample(30, false));
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.sample_count, 2);
    }

    #[test]
    fn separates_cache_hit_and_miss_percentiles() {
        let tracker = PerformanceTracker::new(10);
        for _ in 0..5 {
            tracker.record(sample(5, true));
        }
        for _ in 0..5 {
            tracker.record(sample(500, false));
        }
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.cache_hit.p50, 5);
        assert_eq!(snapshot.cache_miss.p50, 500);
        assert!((snapshot.cache_hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_tracker_reports_zeroed_snapshot() {
        let tracker = PerformanceTracker::new(10);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.sample_count, 0);
        assert_eq!(snapshot.overall.p99, 0);
    }
}
