//! Constants used throughout the Glyco core crate.

/// Durable storage key holding the opaque session token.
pub const TOKEN_KEY: &str = "auth_token";

/// Durable storage key holding the serialized identity.
pub const IDENTITY_KEY: &str = "auth_user";

/// Transient storage key holding the most recent risk assessment.
pub const LATEST_PREDICTION_KEY: &str = "latestPrediction";

/// Default location of the durable session file when none is configured.
pub const DEFAULT_SESSION_FILE: &str = "glyco_data/session.json";

/// Probability above which the prediction is positive.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Artificial latency of the mock auth backend.
pub const DEFAULT_MOCK_AUTH_DELAY_MS: u64 = 1_000;

/// Artificial latency of the mock inference backend.
pub const DEFAULT_MOCK_PREDICT_DELAY_MS: u64 = 2_000;

/// Upper bound on a single prediction round trip.
pub const DEFAULT_PREDICT_TIMEOUT_MS: u64 = 10_000;

/// Attempts (including the first) for idempotent reads.
pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

/// Base backoff between idempotent read attempts; doubles per retry.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Model identifier reported by the mock inference backend.
pub const MOCK_MODEL_ID: &str = "Ensemble-XGBoost-v2.1";
