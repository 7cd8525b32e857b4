//! Fan-out of workers against a shared client, fan-in and aggregation.

use crate::config::RunConfig;
use crate::error::{LoadResult, LoadTestError};
use crate::outcome::WorkerResult;
use crate::summary::Summary;
use crate::worker::WorkerLoop;
use indicatif::ProgressBar;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Lifecycle of a coordinator. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Aggregating,
    Done,
}

/// Runs one load test: `concurrency` workers, joined, then summarized.
pub struct LoadTestCoordinator {
    config: RunConfig,
    state: RunState,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl LoadTestCoordinator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Use `token` to interrupt the run. Outcomes collected before the
    /// cancellation are still summarized.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report per-request progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the load test to completion.
    ///
    /// Fails only on configuration or setup problems (before any worker is
    /// started) or when a worker task itself dies. Request failures end up
    /// in the summary's failure count.
    pub async fn run(&mut self) -> LoadResult<Summary> {
        if self.state != RunState::Idle {
            return Err(LoadTestError::AlreadyRun);
        }

        let url = Arc::new(self.config.validate()?);
        let client = build_client(&self.config)?;

        let concurrency = self.config.concurrency;
        let requests = self.config.requests_per_worker;

        info!(
            url = %url,
            users = concurrency,
            requests_per_user = requests,
            total = self.config.total_requests(),
            "Starting load test"
        );

        if let Some(pb) = &self.progress {
            pb.set_length(self.config.total_requests());
        }

        self.state = RunState::Running;
        let start = Instant::now();

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            let mut worker = WorkerLoop::new(id, client.clone(), url.clone(), requests)
                .with_cancellation(self.cancel.clone());
            if let Some(pb) = &self.progress {
                worker = worker.with_progress(pb.clone());
            }
            workers.spawn(worker.run());
        }

        let results = match join_workers(workers).await {
            Ok(results) => results,
            Err(e) => {
                self.state = RunState::Done;
                return Err(e);
            }
        };

        let elapsed = start.elapsed();
        self.state = RunState::Aggregating;

        // A token fired after every worker finished does not make the run partial.
        let cancelled = results.iter().any(WorkerResult::is_interrupted);
        let summary = Summary::from_outcomes(
            concurrency,
            results.into_iter().flatten(),
            elapsed,
            cancelled,
        );

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        self.state = RunState::Done;

        info!(
            total = summary.total_requests,
            successes = summary.successes,
            failures = summary.failures,
            avg_ms = summary.average_latency.as_secs_f64() * 1000.0,
            elapsed_ms = elapsed.as_millis() as u64,
            cancelled,
            "Load test complete"
        );

        Ok(summary)
    }
}

/// Run a load test with default options.
pub async fn run(config: RunConfig) -> LoadResult<Summary> {
    LoadTestCoordinator::new(config).run().await
}

/// Wait for every worker. If one dies, abort and drain the rest.
async fn join_workers<T: 'static>(mut workers: JoinSet<T>) -> LoadResult<Vec<T>> {
    let mut results = Vec::with_capacity(workers.len());
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(error = %e, "Worker task failed, aborting remaining workers");
                workers.abort_all();
                while workers.join_next().await.is_some() {}
                return Err(LoadTestError::WorkerPanicked(e.to_string()));
            }
        }
    }
    Ok(results)
}

/// Build the pooled client shared by every worker.
fn build_client(config: &RunConfig) -> LoadResult<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(config.concurrency as usize)
        .tcp_nodelay(true);

    if config.insecure {
        warn!("TLS certificate validation is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}
