//! Prediction gateway: the caller-facing entry point for risk predictions and assessment reads.
//!
//! The gateway wraps an [`InferenceBackend`] (in-process mock or remote HTTP service) and a
//! [`ModelRegistry`], and enforces the contract every backend must honour:
//!
//! - `predict` is bounded by the configured timeout and is never retried.
//! - A returned assessment must be internally consistent (probability in `[0, 1]`, prediction
//!   and risk level derived from that same probability) and must belong to the submitted record
//!   and subject; anything else is `GlycoError::InvalidModelState`.
//! - History, by-id and model-status reads are idempotent and use bounded retry.
//!
//! Range validation is not done here. See [`crate::service::PredictionService`].

use crate::assessment::RiskAssessment;
use crate::config::CoreConfig;
use crate::identity::Credential;
use crate::ids::{PredictionId, UserId};
use crate::metrics::HealthMetricsRecord;
use crate::model::{ModelDescriptor, ModelRegistry};
use crate::retry::{retry_idempotent, RetryPolicy};
use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Remote inference service. Each call carries the caller's credential.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn predict(
        &self,
        credential: &Credential,
        metrics: &HealthMetricsRecord,
    ) -> GlycoResult<RiskAssessment>;

    /// Assessments for `subject`, newest first.
    async fn history(
        &self,
        credential: &Credential,
        subject: &UserId,
    ) -> GlycoResult<Vec<RiskAssessment>>;

    async fn assessment(
        &self,
        credential: &Credential,
        id: &PredictionId,
    ) -> GlycoResult<Option<RiskAssessment>>;
}

pub struct PredictionGateway {
    backend: Arc<dyn InferenceBackend>,
    registry: Arc<dyn ModelRegistry>,
    predict_timeout: Duration,
    threshold: f64,
    read_retry: RetryPolicy,
}

impl PredictionGateway {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        registry: Arc<dyn ModelRegistry>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            predict_timeout: config.predict_timeout(),
            threshold: config.decision_threshold(),
            read_retry: config.read_retry().clone(),
        }
    }

    pub async fn predict(
        &self,
        credential: &Credential,
        metrics: &HealthMetricsRecord,
    ) -> GlycoResult<RiskAssessment> {
        let assessment = tokio::time::timeout(
            self.predict_timeout,
            self.backend.predict(credential, metrics),
        )
        .await
        .map_err(|_| GlycoError::GatewayTimeout(self.predict_timeout))??;

        if !assessment.is_consistent(self.threshold) {
            return Err(GlycoError::InvalidModelState(format!(
                "assessment {} is inconsistent (probability {}, prediction {}, risk level {})",
                assessment.id, assessment.probability, assessment.prediction, assessment.risk_level
            )));
        }
        if assessment.input != *metrics || assessment.user_id != credential.identity.id {
            return Err(GlycoError::InvalidModelState(format!(
                "assessment {} does not match the submitted request",
                assessment.id
            )));
        }

        tracing::info!(
            "prediction {} for {}: {} ({})",
            assessment.id,
            assessment.user_id,
            assessment.risk_level,
            assessment.probability_percent()
        );
        Ok(assessment)
    }

    pub async fn get_history(
        &self,
        credential: &Credential,
        subject: &UserId,
    ) -> GlycoResult<Vec<RiskAssessment>> {
        retry_idempotent(&self.read_retry, "history", || {
            self.backend.history(credential, subject)
        })
        .await
    }

    pub async fn get_by_id(
        &self,
        credential: &Credential,
        id: &PredictionId,
    ) -> GlycoResult<Option<RiskAssessment>> {
        retry_idempotent(&self.read_retry, "assessment by id", || {
            self.backend.assessment(credential, id)
        })
        .await
    }

    pub async fn model_status(&self) -> GlycoResult<Vec<ModelDescriptor>> {
        retry_idempotent(&self.read_retry, "model status", || self.registry.models()).await
    }
}
