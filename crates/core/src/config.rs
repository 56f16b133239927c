//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the client and the
//! mock backends. Nothing in this crate reads environment variables while serving a request; the
//! `*_from_env_value` helpers take the raw optional string so the binary decides where values
//! come from.

use crate::constants::{
    DEFAULT_DECISION_THRESHOLD, DEFAULT_MOCK_AUTH_DELAY_MS, DEFAULT_MOCK_PREDICT_DELAY_MS,
    DEFAULT_PREDICT_TIMEOUT_MS, DEFAULT_READ_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS,
    DEFAULT_SESSION_FILE,
};
use crate::retry::RetryPolicy;
use crate::{GlycoError, GlycoResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    session_file: PathBuf,
    mock_auth_delay: Duration,
    mock_predict_delay: Duration,
    predict_timeout: Duration,
    decision_threshold: f64,
    read_retry: RetryPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `GlycoError::InvalidInput` if the threshold is outside `(0, 1)` or the predict
    /// timeout is zero.
    pub fn new(
        session_file: PathBuf,
        mock_auth_delay: Duration,
        mock_predict_delay: Duration,
        predict_timeout: Duration,
        decision_threshold: f64,
        read_retry: RetryPolicy,
    ) -> GlycoResult<Self> {
        if !(decision_threshold > 0.0 && decision_threshold < 1.0) {
            return Err(GlycoError::InvalidInput(format!(
                "decision threshold must be between 0 and 1 (exclusive), got {}",
                decision_threshold
            )));
        }
        if predict_timeout.is_zero() {
            return Err(GlycoError::InvalidInput(
                "predict timeout cannot be zero".into(),
            ));
        }

        Ok(Self {
            session_file,
            mock_auth_delay,
            mock_predict_delay,
            predict_timeout,
            decision_threshold,
            read_retry,
        })
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    pub fn mock_auth_delay(&self) -> Duration {
        self.mock_auth_delay
    }

    pub fn mock_predict_delay(&self) -> Duration {
        self.mock_predict_delay
    }

    pub fn predict_timeout(&self) -> Duration {
        self.predict_timeout
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    pub fn read_retry(&self) -> &RetryPolicy {
        &self.read_retry
    }

    /// Same configuration with both mock delays removed. Used by tests and local tooling.
    pub fn without_mock_delays(mut self) -> Self {
        self.mock_auth_delay = Duration::ZERO;
        self.mock_predict_delay = Duration::ZERO;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            mock_auth_delay: Duration::from_millis(DEFAULT_MOCK_AUTH_DELAY_MS),
            mock_predict_delay: Duration::from_millis(DEFAULT_MOCK_PREDICT_DELAY_MS),
            predict_timeout: Duration::from_millis(DEFAULT_PREDICT_TIMEOUT_MS),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            read_retry: RetryPolicy::new(
                DEFAULT_READ_ATTEMPTS,
                Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            ),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a millisecond duration from an optional string value.
///
/// `None` or empty/whitespace yields `default_ms`.
pub fn duration_ms_from_env_value(
    name: &str,
    value: Option<String>,
    default_ms: u64,
) -> GlycoResult<Duration> {
    let ms = match trimmed(value) {
        Some(v) => v.parse::<u64>().map_err(|e| {
            GlycoError::InvalidInput(format!("{} must be a whole number of milliseconds: {}", name, e))
        })?,
        None => default_ms,
    };
    Ok(Duration::from_millis(ms))
}

/// Parse the decision threshold from an optional string value.
pub fn threshold_from_env_value(value: Option<String>) -> GlycoResult<f64> {
    match trimmed(value) {
        Some(v) => v.parse::<f64>().map_err(|e| {
            GlycoError::InvalidInput(format!("decision threshold must be a number: {}", e))
        }),
        None => Ok(DEFAULT_DECISION_THRESHOLD),
    }
}

/// Parse the number of read attempts from an optional string value. Zero is rejected.
pub fn attempts_from_env_value(value: Option<String>) -> GlycoResult<u32> {
    let attempts = match trimmed(value) {
        Some(v) => v.parse::<u32>().map_err(|e| {
            GlycoError::InvalidInput(format!("read attempts must be a positive integer: {}", e))
        })?,
        None => DEFAULT_READ_ATTEMPTS,
    };
    if attempts == 0 {
        return Err(GlycoError::InvalidInput(
            "read attempts must be at least 1".into(),
        ));
    }
    Ok(attempts)
}
