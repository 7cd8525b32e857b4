//! Per-request outcomes and the per-worker result sequence.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Status code counted as a success during aggregation.
pub const SUCCESS_STATUS: u16 = 200;

/// Classified result of a single request attempt.
///
/// Any received HTTP status is a `Success` at this level; whether it counts
/// as a success in the summary is decided by aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Success { status_code: u16, latency: Duration },
    /// Transport-level failure. Latency is always zero.
    Failure { kind: FailureKind, latency: Duration },
}

/// What went wrong below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, reset, DNS or TLS handshake failure.
    Connect,
    Timeout,
    /// Response started but the body could not be read to the end.
    Body,
    /// The request could not be built or sent.
    Request,
    Other,
}

impl Outcome {
    pub fn success(status_code: u16, latency: Duration) -> Self {
        Outcome::Success {
            status_code,
            latency,
        }
    }

    pub fn failure(kind: FailureKind) -> Self {
        Outcome::Failure {
            kind,
            latency: Duration::ZERO,
        }
    }

    /// True only for a completed response with status 200.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Success { status_code, .. } if *status_code == SUCCESS_STATUS)
    }

    pub fn latency(&self) -> Duration {
        match self {
            Outcome::Success { latency, .. } | Outcome::Failure { latency, .. } => *latency,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Success { status_code, .. } => Some(*status_code),
            Outcome::Failure { .. } => None,
        }
    }

    /// Key used for the status breakdown in reports.
    pub fn status_key(&self) -> String {
        match self {
            Outcome::Success { status_code, .. } => status_code.to_string(),
            Outcome::Failure { kind, .. } => kind.to_string(),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Connect => "CONNECT_ERROR",
            FailureKind::Timeout => "TIMEOUT",
            FailureKind::Body => "BODY_ERROR",
            FailureKind::Request => "REQUEST_ERROR",
            FailureKind::Other => "UNKNOWN_ERROR",
        };
        f.write_str(label)
    }
}

/// Outcomes produced by one worker, in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerResult {
    outcomes: Vec<Outcome>,
    interrupted: bool,
}

impl WorkerResult {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
            interrupted: false,
        }
    }

    /// Record that the worker stopped before finishing its iterations.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }
}

impl IntoIterator for WorkerResult {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_200_is_ok() {
        let ms = Duration::from_millis(5);
        assert!(Outcome::success(200, ms).is_ok());
        assert!(!Outcome::success(201, ms).is_ok());
        assert!(!Outcome::success(304, ms).is_ok());
        assert!(!Outcome::success(500, ms).is_ok());
        assert!(!Outcome::failure(FailureKind::Connect).is_ok());
    }

    #[test]
    fn test_failure_latency_is_zero() {
        let outcome = Outcome::failure(FailureKind::Timeout);
        assert_eq!(outcome.latency(), Duration::ZERO);
        assert_eq!(outcome.status_code(), None);
        assert_eq!(outcome.status_key(), "TIMEOUT");
    }

    #[test]
    fn test_worker_result_preserves_order() {
        let mut result = WorkerResult::with_capacity(3);
        result.push(Outcome::success(200, Duration::from_millis(1)));
        result.push(Outcome::failure(FailureKind::Connect));
        result.push(Outcome::success(404, Duration::from_millis(2)));

        assert_eq!(result.len(), 3);
        let codes: Vec<_> = result.iter().map(|o| o.status_code()).collect();
        assert_eq!(codes, vec![Some(200), None, Some(404)]);
        assert!(!result.is_interrupted());
    }

    #[test]
    fn test_interrupted_flag() {
        let mut result = WorkerResult::default();
        result.push(Outcome::success(200, Duration::from_millis(1)));
        result.mark_interrupted();

        assert!(result.is_interrupted());
        assert_eq!(result.into_iter().count(), 1);
    }
}
