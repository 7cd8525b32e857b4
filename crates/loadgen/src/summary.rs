//! Aggregation of collected outcomes into the final run summary.

use crate::outcome::Outcome;
use hdrhistogram::Histogram;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Final, immutable result of a load test run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub timestamp: String,
    pub users: u32,
    pub total_requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Mean over every outcome, failures included at zero latency.
    #[serde(rename = "average_latency_secs", serialize_with = "as_secs")]
    pub average_latency: Duration,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    pub requests_per_second: f64,

    // Percentiles over completed responses (ms)
    pub latency: LatencyStats,

    /// Counts keyed by status code or failure kind.
    pub status_counts: BTreeMap<String, u64>,

    /// Set when the run was interrupted; counts cover collected outcomes only.
    pub cancelled: bool,
}

/// Latency distribution of completed responses, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl Summary {
    /// Reduce a flattened multiset of outcomes. Order does not matter.
    pub fn from_outcomes<I>(users: u32, outcomes: I, elapsed: Duration, cancelled: bool) -> Self
    where
        I: IntoIterator<Item = Outcome>,
    {
        let mut histogram = Histogram::<u64>::new(3).ok();
        let mut total_requests = 0u64;
        let mut successes = 0u64;
        let mut latency_nanos = 0u128;
        let mut status_counts = BTreeMap::new();

        for outcome in outcomes {
            total_requests += 1;
            if outcome.is_ok() {
                successes += 1;
            }

            let latency = outcome.latency();
            latency_nanos += latency.as_nanos();

            if let (Outcome::Success { .. }, Some(h)) = (&outcome, histogram.as_mut()) {
                h.record(latency.as_micros() as u64).ok();
            }

            *status_counts.entry(outcome.status_key()).or_insert(0) += 1;
        }

        let average_latency =
            Duration::from_nanos((latency_nanos / total_requests.max(1) as u128) as u64);

        let elapsed_secs = elapsed.as_secs_f64();
        let requests_per_second = if elapsed_secs > 0.0 {
            total_requests as f64 / elapsed_secs
        } else {
            0.0
        };

        let latency = histogram
            .filter(|h| h.len() > 0)
            .map(|h| LatencyStats::from_histogram(&h))
            .unwrap_or_default();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            users,
            total_requests,
            successes,
            failures: total_requests - successes,
            average_latency,
            elapsed,
            requests_per_second,
            latency,
            status_counts,
            cancelled,
        }
    }

    /// Fraction of requests that returned 200, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_requests as f64 * 100.0
        }
    }
}

impl LatencyStats {
    fn from_histogram(h: &Histogram<u64>) -> Self {
        let ms = |us: u64| us as f64 / 1000.0;
        Self {
            min_ms: ms(h.min()),
            p50_ms: ms(h.value_at_percentile(50.0)),
            p90_ms: ms(h.value_at_percentile(90.0)),
            p99_ms: ms(h.value_at_percentile(99.0)),
            max_ms: ms(h.max()),
        }
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
