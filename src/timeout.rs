//! Timeout utilities for waiting on background ingest jobs.

use crate::error::{CellexError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

/// Default timeout duration in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300; // 5 minutes

/// Fast operation timeout in seconds
pub const FAST_TIMEOUT_SECONDS: u64 = 10;

/// Timeout configuration for a wait
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum duration for the operation
    pub duration: Duration,
    /// Whether to log expiry at error level
    pub log_warnings: bool,
    /// Operation name for logging
    pub operation_name: String,
}

impl TimeoutConfig {
    pub fn new(duration: Duration, operation: impl Into<String>) -> Self {
        Self {
            duration,
            log_warnings: true,
            operation_name: operation.into(),
        }
    }

    pub fn from_secs(seconds: u64, operation: impl Into<String>) -> Self {
        Self::new(Duration::from_secs(seconds), operation)
    }

    pub fn fast(operation: impl Into<String>) -> Self {
        Self::from_secs(FAST_TIMEOUT_SECONDS, operation)
    }

    pub fn default_timeout(operation: impl Into<String>) -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECONDS, operation)
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(config: TimeoutConfig, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(
        "Starting operation '{}' with timeout of {:?}",
        config.operation_name, config.duration
    );

    match timeout(config.duration, future).await {
        Ok(result) => {
            debug!("Operation '{}' completed", config.operation_name);
            result
        }
        Err(_) => {
            if config.log_warnings {
                error!(
                    "Operation '{}' timed out after {:?}",
                    config.operation_name, config.duration
                );
            }

            Err(CellexError::Timeout {
                seconds: config.duration.as_secs(),
            })
        }
    }
}
