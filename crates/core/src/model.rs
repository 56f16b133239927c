//! Read-only metadata about deployed model versions.

use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Active,
    Training,
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    pub version: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub last_trained: DateTime<Utc>,
    pub status: ModelStatus,
}

impl ModelDescriptor {
    /// `name-version`, the form recorded in `RiskAssessment::model_used`.
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Deployed models in registry order.
    async fn models(&self) -> GlycoResult<Vec<ModelDescriptor>>;
}

/// Registry serving a fixed list of descriptors.
#[derive(Clone, Debug)]
pub struct StaticModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl StaticModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// The two models the product ships with.
    pub fn reference() -> GlycoResult<Self> {
        Ok(Self::new(vec![
            ModelDescriptor {
                name: "Ensemble-XGBoost".into(),
                version: "v2.1".into(),
                accuracy: 0.876,
                precision: 0.823,
                recall: 0.791,
                f1_score: 0.807,
                roc_auc: 0.912,
                last_trained: parse_timestamp("2024-01-15T10:30:00Z")?,
                status: ModelStatus::Active,
            },
            ModelDescriptor {
                name: "Random Forest".into(),
                version: "v1.8".into(),
                accuracy: 0.854,
                precision: 0.801,
                recall: 0.778,
                f1_score: 0.789,
                roc_auc: 0.891,
                last_trained: parse_timestamp("2024-01-10T14:20:00Z")?,
                status: ModelStatus::Active,
            },
        ]))
    }
}

fn parse_timestamp(value: &str) -> GlycoResult<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| GlycoError::InvalidModelState(format!("bad training timestamp '{}': {}", value, e)))
}

#[async_trait]
impl ModelRegistry for StaticModelRegistry {
    async fn models(&self) -> GlycoResult<Vec<ModelDescriptor>> {
        Ok(self.models.clone())
    }
}
