//! In-process stand-in for the inference service.

use crate::assessment::{AssessmentParts, FeatureAttribution, RiskAssessment};
use crate::constants::MOCK_MODEL_ID;
use crate::gateway::InferenceBackend;
use crate::history::AssessmentStore;
use crate::identity::Credential;
use crate::ids::{PredictionId, UserId};
use crate::metrics::HealthMetricsRecord;
use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use chrono::Utc;
use glyco_uuid::AssessmentId;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where the mock's probability comes from.
pub trait ProbabilitySource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Uniform draw from `[0, 1)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomProbability;

impl ProbabilitySource for RandomProbability {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always the same probability. Used for deterministic scenarios.
#[derive(Clone, Copy, Debug)]
pub struct FixedProbability(pub f64);

impl ProbabilitySource for FixedProbability {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// Fixed-weight attributions for the five features the reference model reports.
fn attributions(metrics: &HealthMetricsRecord) -> Vec<FeatureAttribution> {
    [
        ("Glucose", metrics.glucose, 0.25),
        ("BMI", metrics.bmi, 0.18),
        ("Age", metrics.age, 0.15),
        ("Diabetes Pedigree", metrics.diabetes_pedigree_function, 0.12),
        ("Pregnancies", metrics.pregnancies, 0.10),
    ]
    .into_iter()
    .map(|(feature, value, impact)| FeatureAttribution {
        feature: feature.to_string(),
        value,
        impact,
    })
    .collect()
}

/// Mock inference backend. Resolves after `delay`, records each assessment so that history and
/// by-id reads can find it again for the lifetime of the process.
pub struct MockInference {
    delay: Duration,
    threshold: f64,
    source: Arc<dyn ProbabilitySource>,
    store: AssessmentStore,
    last_id: Mutex<Option<AssessmentId>>,
}

impl MockInference {
    pub fn new(delay: Duration, threshold: f64, source: Arc<dyn ProbabilitySource>) -> Self {
        Self {
            delay,
            threshold,
            source,
            store: AssessmentStore::new(),
            last_id: Mutex::new(None),
        }
    }

    /// Mock with uniformly random probabilities.
    pub fn random(delay: Duration, threshold: f64) -> Self {
        Self::new(delay, threshold, Arc::new(RandomProbability))
    }

    pub fn store(&self) -> &AssessmentStore {
        &self.store
    }

    fn next_id(&self) -> GlycoResult<PredictionId> {
        let mut last = self.last_id.lock().unwrap_or_else(|p| p.into_inner());
        let (id, generated) = PredictionId::generate(last.as_ref())?;
        *last = Some(generated);
        Ok(id)
    }

    fn draw_probability(&self) -> GlycoResult<f64> {
        let probability = self.source.draw();
        if probability.is_nan() {
            return Err(GlycoError::InvalidModelState(
                "probability source produced NaN".into(),
            ));
        }
        Ok(probability.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl InferenceBackend for MockInference {
    async fn predict(
        &self,
        credential: &Credential,
        metrics: &HealthMetricsRecord,
    ) -> GlycoResult<RiskAssessment> {
        tokio::time::sleep(self.delay).await;

        let probability = self.draw_probability()?;
        let parts = AssessmentParts {
            id: self.next_id()?,
            user_id: credential.identity.id.clone(),
            input: *metrics,
            shap_values: attributions(metrics),
            model_used: MOCK_MODEL_ID.to_string(),
            created_at: Utc::now(),
        };
        let assessment = RiskAssessment::assemble(parts, probability, self.threshold);
        self.store.record(assessment.clone());
        Ok(assessment)
    }

    async fn history(
        &self,
        _credential: &Credential,
        subject: &UserId,
    ) -> GlycoResult<Vec<RiskAssessment>> {
        Ok(self.store.for_subject(subject))
    }

    async fn assessment(
        &self,
        _credential: &Credential,
        id: &PredictionId,
    ) -> GlycoResult<Option<RiskAssessment>> {
        Ok(self.store.get(id))
    }
}
