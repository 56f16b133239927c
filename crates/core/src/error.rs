use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GlycoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("{field} must be between {min} and {max}")]
    Validation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("prediction service unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("prediction service timed out after {0:?}")]
    GatewayTimeout(Duration),
    #[error("invalid model state: {0}")]
    InvalidModelState(String),
    #[error("malformed persisted session: {0}")]
    MalformedPersistedState(String),
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("{role} is not permitted to open {view}")]
    Forbidden {
        role: crate::identity::Role,
        view: crate::identity::View,
    },

    #[error("failed to read storage: {0}")]
    StorageRead(std::io::Error),
    #[error("failed to write storage: {0}")]
    StorageWrite(std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize: {0}")]
    Deserialization(serde_json::Error),

    #[error("text error: {0}")]
    Text(#[from] glyco_types::TextError),
}

impl GlycoError {
    /// True for failures where repeating an idempotent read may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GlycoError::GatewayUnavailable(_) | GlycoError::GatewayTimeout(_)
        )
    }
}

pub type GlycoResult<T> = std::result::Result<T, GlycoError>;
