//! Concurrent HTTP load generation.
//!
//! A run simulates `concurrency` independent users, each issuing
//! `requests_per_worker` sequential GET requests through one shared,
//! pooled client. Every worker owns its outcomes until it is joined; the
//! coordinator then reduces all of them into a single [`Summary`].
//!
//! ```ignore
//! let summary = loadgen::run(loadgen::RunConfig::new("http://localhost:8080/", 10, 5)).await?;
//! println!("{}", loadgen::ResultsReport::format_line(&summary));
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod report;
pub mod summary;
pub mod worker;

pub use config::RunConfig;
pub use coordinator::{run, LoadTestCoordinator, RunState};
pub use error::{LoadResult, LoadTestError};
pub use executor::execute;
pub use outcome::{FailureKind, Outcome, WorkerResult, SUCCESS_STATUS};
pub use report::ResultsReport;
pub use summary::{LatencyStats, Summary};
pub use worker::WorkerLoop;

// Re-exported so callers can cancel runs without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
