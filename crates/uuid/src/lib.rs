//! Identifier types for Glyco.
//!
//! Two identifier shapes are used across the workspace:
//! - [`CanonicalId`]: a UUID in **32 lowercase hexadecimal characters** (no hyphens). Identity
//!   ids use this form, e.g. `550e8400e29b41d4a716446655440000`.
//! - [`AssessmentId`]: a time-prefixed id `YYYYMMDDTHHMMSS.mmmZ-<canonical uuid>` for risk
//!   assessments. Sorting the string form sorts assessments by creation time.
//!
//! Externally supplied identifiers (HTTP paths, persisted session JSON) must already be in
//! canonical form; non-canonical values are rejected rather than normalised.

mod service;

pub use service::{AssessmentId, CanonicalId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
