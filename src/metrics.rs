//! Timing samples for scrape operations.
//!
//! Constructed once by [`AppContext`](crate::app::AppContext) and handed to
//! whoever records into it; there is no process-wide instance.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Samples kept per operation name
pub const MAX_SAMPLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct ScrapeMetrics {
    samples: Mutex<HashMap<String, VecDeque<Duration>>>,
}

impl ScrapeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one duration, dropping the oldest sample past [`MAX_SAMPLES`].
    pub fn record(&self, name: &str, duration: Duration) {
        let Ok(mut samples) = self.samples.lock() else {
            return;
        };
        let times = samples.entry(name.to_string()).or_default();
        times.push_back(duration);
        if times.len() > MAX_SAMPLES {
            times.pop_front();
        }
    }

    pub fn stats(&self, name: &str) -> Option<TimingStats> {
        let samples = self.samples.lock().ok()?;
        samples.get(name).and_then(|times| summarize(times))
    }

    pub fn all_stats(&self) -> BTreeMap<String, TimingStats> {
        let Ok(samples) = self.samples.lock() else {
            return BTreeMap::new();
        };
        samples
            .iter()
            .filter_map(|(name, times)| summarize(times).map(|s| (name.clone(), s)))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
    }
}

fn summarize(times: &VecDeque<Duration>) -> Option<TimingStats> {
    if times.is_empty() {
        return None;
    }
    let ms: Vec<f64> = times.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
    let sum: f64 = ms.iter().sum();
    Some(TimingStats {
        avg_ms: sum / ms.len() as f64,
        min_ms: ms.iter().copied().fold(f64::INFINITY, f64::min),
        max_ms: ms.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: ms.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summarize_samples() {
        let metrics = ScrapeMetrics::new();
        metrics.record("page_load", Duration::from_millis(10));
        metrics.record("page_load", Duration::from_millis(30));

        let stats = metrics.stats("page_load").unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.avg_ms - 20.0).abs() < 1e-9);
        assert!((stats.min_ms - 10.0).abs() < 1e-9);
        assert!((stats.max_ms - 30.0).abs() < 1e-9);
        assert!(metrics.stats("missing").is_none());
    }

    #[test]
    fn test_keeps_most_recent_samples() {
        let metrics = ScrapeMetrics::new();
        for i in 0..(MAX_SAMPLES as u64 + 20) {
            metrics.record("extract", Duration::from_millis(i));
        }
        let stats = metrics.stats("extract").unwrap();
        assert_eq!(stats.count, MAX_SAMPLES);
        assert!((stats.min_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_stats_and_clear() {
        let metrics = ScrapeMetrics::new();
        metrics.record("a", Duration::from_millis(1));
        metrics.record("b", Duration::from_millis(2));
        assert_eq!(metrics.all_stats().len(), 2);

        metrics.clear();
        assert!(metrics.all_stats().is_empty());
    }
}
