//! One simulated user issuing sequential requests.

use crate::executor;
use crate::outcome::{Outcome, WorkerResult};
use indicatif::ProgressBar;
use reqwest::{Client, Url};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Drives `requests` sequential calls to the executor for one user.
pub struct WorkerLoop {
    id: u32,
    client: Client,
    url: Arc<Url>,
    requests: u64,
    cancel: Option<CancellationToken>,
    progress: Option<ProgressBar>,
}

impl WorkerLoop {
    pub fn new(id: u32, client: Client, url: Arc<Url>, requests: u64) -> Self {
        Self {
            id,
            client,
            url,
            requests,
            cancel: None,
            progress: None,
        }
    }

    /// Stop early when `token` is cancelled, dropping the in-flight request.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Tick `progress` once per completed request.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every iteration and return the outcomes in call order.
    ///
    /// A failed request never aborts the loop. Unless the result is marked
    /// interrupted it holds exactly `requests` entries.
    pub async fn run(self) -> WorkerResult {
        let mut result = WorkerResult::with_capacity(self.requests.min(1 << 16) as usize);

        for _ in 0..self.requests {
            let outcome = match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            result.mark_interrupted();
                            break;
                        }
                        outcome = executor::execute(&self.client, &self.url) => outcome,
                    }
                }
                None => executor::execute(&self.client, &self.url).await,
            };

            if let Outcome::Failure { kind, .. } = outcome {
                trace!(worker = self.id, kind = %kind, "Request failed");
            }

            result.push(outcome);
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        debug!(worker = self.id, completed = result.len(), "Worker finished");
        result
    }
}
