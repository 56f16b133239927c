//! Carries the most recent assessment from the prediction flow to the results view.

use crate::assessment::RiskAssessment;
use crate::constants::LATEST_PREDICTION_KEY;
use crate::storage::KeyValueStore;
use crate::{GlycoError, GlycoResult};
use std::sync::Arc;

pub struct ResultHandoff {
    storage: Arc<dyn KeyValueStore>,
}

impl ResultHandoff {
    /// `storage` should be transient (per session), not the durable session file.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Replaces any previously published assessment.
    pub fn publish(&self, assessment: &RiskAssessment) -> GlycoResult<()> {
        let json = serde_json::to_string(assessment).map_err(GlycoError::Serialization)?;
        self.storage.set(LATEST_PREDICTION_KEY, json)
    }

    /// The last published assessment. Missing or unparseable content reads as `None`.
    pub fn latest(&self) -> Option<RiskAssessment> {
        let raw = match self.storage.get(LATEST_PREDICTION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("cannot read latest prediction: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(assessment) => Some(assessment),
            Err(e) => {
                tracing::warn!("discarding malformed latest prediction: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> GlycoResult<()> {
        self.storage.remove(LATEST_PREDICTION_KEY)
    }
}
