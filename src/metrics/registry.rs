//! In-memory metrics registry: counters, gauges, histograms, named timers

use super::types::{
    GaugePoint, HistogramSample, HistogramStats, MAX_HISTOGRAM_SAMPLES, MetricsSnapshot,
    metric_key,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Helper trait for size-capped VecDeque pushes
trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T, max_size: usize);
}

impl<T> BoundedPush<T> for VecDeque<T> {
    /// Push a value while maintaining a maximum size (O(1) amortized)
    #[inline]
    fn push_bounded(&mut self, value: T, max_size: usize) {
        if self.len() >= max_size {
            self.pop_front();
        }
        self.push_back(value);
    }
}

#[derive(Debug, Clone)]
struct ActiveTimer {
    name: String,
    tags: Vec<(String, String)>,
    started: Instant,
}

#[derive(Debug, Default)]
struct MetricsStorage {
    counters: HashMap<String, u64>,
    gauges: HashMap<String, GaugePoint>,
    histograms: HashMap<String, VecDeque<HistogramSample>>,
    timers: HashMap<String, ActiveTimer>,
}

/// Metrics engine
///
/// All mutation is synchronous; histogram series keep a sliding window of the
/// 1000 most recent samples, so recent behavior is always visible while
/// long-run aggregates are approximate.
#[derive(Debug)]
pub struct MetricsRegistry {
    storage: RwLock<MetricsStorage>,
    started: RwLock<Instant>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create an empty registry and start the uptime clock
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(MetricsStorage::default()),
            started: RwLock::new(Instant::now()),
        }
    }

    /// Add to a counter, creating it at `value` when absent
    pub fn increment(&self, name: &str, value: u64, tags: &[(&str, &str)]) {
        let key = metric_key(name, tags);
        *self.storage.write().counters.entry(key).or_insert(0) += value;
    }

    /// Overwrite a gauge with the latest observation (last-write-wins)
    pub fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let key = metric_key(name, tags);
        self.storage.write().gauges.insert(
            key,
            GaugePoint {
                value,
                timestamp: Utc::now(),
            },
        );
    }

    /// Append a histogram observation, evicting the oldest beyond the cap
    pub fn histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let key = metric_key(name, tags);
        self.storage
            .write()
            .histograms
            .entry(key)
            .or_default()
            .push_bounded(
                HistogramSample {
                    value,
                    timestamp: Utc::now(),
                },
                MAX_HISTOGRAM_SAMPLES,
            );
    }

    /// Start a named timer; the returned id is unique across concurrent
    /// timers of the same name
    pub fn start_timer(&self, name: &str, tags: &[(&str, &str)]) -> String {
        let id = format!(
            "{}_{}_{}",
            name,
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        );
        let timer = ActiveTimer {
            name: name.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            started: Instant::now(),
        };
        self.storage.write().timers.insert(id.clone(), timer);
        id
    }

    /// Stop a timer, record its duration into `<name>_duration`, and return
    /// the elapsed milliseconds (0 for an unknown id)
    pub fn stop_timer(&self, id: &str) -> u64 {
        self.try_stop_timer(id).unwrap_or(0)
    }

    /// Like [`stop_timer`](Self::stop_timer), but distinguishes an unknown
    /// id from a sub-millisecond duration
    pub fn try_stop_timer(&self, id: &str) -> Option<u64> {
        let timer = self.storage.write().timers.remove(id)?;

        let elapsed_ms = timer.started.elapsed().as_millis() as u64;
        let tags: Vec<(&str, &str)> = timer
            .tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.histogram(&format!("{}_duration", timer.name), elapsed_ms as f64, &tags);
        Some(elapsed_ms)
    }

    /// Number of timers currently running
    pub fn active_timers(&self) -> usize {
        self.storage.read().timers.len()
    }

    /// Point-in-time copy of every series with histogram statistics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let storage = self.storage.read();
        let histograms: HashMap<String, HistogramStats> = storage
            .histograms
            .iter()
            .filter_map(|(key, samples)| {
                let (front, back) = samples.as_slices();
                let stats = if back.is_empty() {
                    HistogramStats::from_samples(front)
                } else {
                    let joined: Vec<HistogramSample> = samples.iter().copied().collect();
                    HistogramStats::from_samples(&joined)
                };
                stats.map(|s| (key.clone(), s))
            })
            .collect();

        MetricsSnapshot {
            timestamp: Utc::now(),
            uptime_ms: self.started.read().elapsed().as_millis() as u64,
            counters: storage.counters.clone(),
            gauges: storage.gauges.clone(),
            histograms,
        }
    }

    /// Number of retained samples in one histogram series
    pub fn histogram_len(&self, name: &str, tags: &[(&str, &str)]) -> usize {
        let key = metric_key(name, tags);
        self.storage
            .read()
            .histograms
            .get(&key)
            .map_or(0, VecDeque::len)
    }

    /// Clear every series and restart the uptime clock
    pub fn reset(&self) {
        *self.storage.write() = MetricsStorage::default();
        *self.started.write() = Instant::now();
    }
}
