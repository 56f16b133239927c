//! # Glyco Core
//!
//! Core logic for the Glyco diabetes risk assessment client.
//!
//! This crate contains:
//! - The session store, which owns the authenticated identity and its token
//! - The prediction gateway over an inference backend, with timeout and read retry
//! - Mock collaborators (auth, inference, model registry) and an HTTP client backend
//! - Keyed storage for the durable session and the transient result handoff
//!
//! **No server concerns**: routing and HTTP status mapping live in `api-rest`.

pub mod assessment;
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod handoff;
pub mod history;
pub mod http;
pub mod identity;
pub mod ids;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod retry;
pub mod service;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use assessment::{FeatureAttribution, RiskAssessment, RiskLevel};
pub use auth::{AuthBackend, MockAuthBackend};
pub use client::GlycoClient;
pub use config::CoreConfig;
pub use error::{GlycoError, GlycoResult};
pub use gateway::{InferenceBackend, PredictionGateway};
pub use handoff::ResultHandoff;
pub use history::AssessmentStore;
pub use http::HttpBackend;
pub use identity::{AuthGrant, Credential, Identity, Role, SessionToken, View};
pub use ids::{PredictionId, UserId};
pub use inference::MockInference;
pub use metrics::HealthMetricsRecord;
pub use model::{ModelDescriptor, ModelRegistry, ModelStatus, StaticModelRegistry};
pub use service::PredictionService;
pub use session::{SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use glyco_types::{EmailAddress, NonEmptyText};
