//! Error types for load generation runs.
//!
//! Only setup problems are errors. Transport failures of individual requests
//! are data (`Outcome::Failure`) and never show up here.

use thiserror::Error;

/// Result type alias using LoadTestError.
pub type LoadResult<T> = Result<T, LoadTestError>;

/// Fatal errors that stop a run before (or instead of) producing a Summary.
#[derive(Debug, Error)]
pub enum LoadTestError {
    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to load scenario: {0}")]
    Scenario(String),

    // === Setup Errors ===
    #[error("Failed to create HTTP client: {0}")]
    ClientSetup(#[from] reqwest::Error),

    // === Run Errors ===
    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),

    #[error("Coordinator has already been run")]
    AlreadyRun,
}

impl LoadTestError {
    /// True for errors caused by the caller's configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LoadTestError::InvalidConfig(_)
                | LoadTestError::InvalidUrl { .. }
                | LoadTestError::Scenario(_)
        )
    }
}

impl From<std::io::Error> for LoadTestError {
    fn from(err: std::io::Error) -> Self {
        LoadTestError::Scenario(err.to_string())
    }
}

impl From<serde_yaml::Error> for LoadTestError {
    fn from(err: serde_yaml::Error) -> Self {
        LoadTestError::Scenario(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        assert!(LoadTestError::InvalidConfig("x".into()).is_config_error());
        assert!(LoadTestError::InvalidUrl {
            url: "nope".into(),
            reason: "relative URL without a base".into()
        }
        .is_config_error());
        assert!(!LoadTestError::AlreadyRun.is_config_error());
        assert!(!LoadTestError::WorkerPanicked("boom".into()).is_config_error());
    }

    #[test]
    fn test_error_messages() {
        let err = LoadTestError::InvalidUrl {
            url: "ftp://host".into(),
            reason: "unsupported scheme 'ftp'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid URL 'ftp://host': unsupported scheme 'ftp'"
        );
    }
}
