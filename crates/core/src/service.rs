//! The submit flow used by the prediction form.

use crate::assessment::RiskAssessment;
use crate::gateway::PredictionGateway;
use crate::handoff::ResultHandoff;
use crate::identity::View;
use crate::metrics::HealthMetricsRecord;
use crate::session::SessionStore;
use crate::GlycoResult;
use std::sync::Arc;

pub struct PredictionService {
    session: Arc<SessionStore>,
    gateway: Arc<PredictionGateway>,
    handoff: Arc<ResultHandoff>,
}

impl PredictionService {
    pub fn new(
        session: Arc<SessionStore>,
        gateway: Arc<PredictionGateway>,
        handoff: Arc<ResultHandoff>,
    ) -> Self {
        Self {
            session,
            gateway,
            handoff,
        }
    }

    /// Validates `metrics`, predicts for the signed-in subject and publishes the result for the
    /// results view.
    ///
    /// # Errors
    ///
    /// - `Validation` if any field is out of range. The gateway is not called.
    /// - `NotAuthenticated` without an active session.
    /// - Any gateway error, in which case nothing is published.
    pub async fn submit(&self, metrics: HealthMetricsRecord) -> GlycoResult<RiskAssessment> {
        metrics.validate()?;
        let credential = self.session.require(View::Predict)?;

        let assessment = self.gateway.predict(&credential, &metrics).await?;
        self.handoff.publish(&assessment)?;
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthBackend;
    use crate::config::CoreConfig;
    use crate::inference::{FixedProbability, MockInference};
    use crate::model::StaticModelRegistry;
    use crate::storage::MemoryStore;
    use crate::test_support::pima_sample;
    use crate::GlycoError;
    use std::time::Duration;

    struct Fixture {
        session: Arc<SessionStore>,
        inference: Arc<MockInference>,
        handoff: Arc<ResultHandoff>,
        service: PredictionService,
    }

    async fn fixture() -> Fixture {
        let session = Arc::new(SessionStore::new(
            Arc::new(MockAuthBackend::new(Duration::ZERO)),
            Arc::new(MemoryStore::new()),
        ));
        session.restore().await;
        let inference = Arc::new(MockInference::new(
            Duration::ZERO,
            0.5,
            Arc::new(FixedProbability(0.74)),
        ));
        let gateway = Arc::new(PredictionGateway::new(
            inference.clone(),
            Arc::new(StaticModelRegistry::reference().unwrap()),
            &CoreConfig::default().without_mock_delays(),
        ));
        let handoff = Arc::new(ResultHandoff::new(Arc::new(MemoryStore::new())));
        let service = PredictionService::new(session.clone(), gateway, handoff.clone());
        Fixture {
            session,
            inference,
            handoff,
            service,
        }
    }

    #[tokio::test]
    async fn submit_predicts_and_hands_off() {
        let f = fixture().await;
        let identity = f.session.login("pat@example.com", "pw").await.unwrap();

        let assessment = f.service.submit(pima_sample()).await.unwrap();

        assert_eq!(assessment.user_id, identity.id);
        assert_eq!(f.handoff.latest(), Some(assessment));
    }

    #[tokio::test]
    async fn out_of_range_metrics_never_reach_the_gateway() {
        let f = fixture().await;
        let identity = f.session.login("pat@example.com", "pw").await.unwrap();
        let metrics = HealthMetricsRecord {
            glucose: 250.0,
            ..pima_sample()
        };

        let err = f.service.submit(metrics).await.expect_err("out of range");

        assert!(matches!(err, GlycoError::Validation { field: "glucose", .. }));
        assert_eq!(err.to_string(), "glucose must be between 0 and 200");
        assert!(f.inference.store().for_subject(&identity.id).is_empty());
        assert_eq!(f.handoff.latest(), None);
    }

    #[tokio::test]
    async fn submit_requires_a_session() {
        let f = fixture().await;
        let err = f.service.submit(pima_sample()).await.expect_err("signed out");
        assert!(matches!(err, GlycoError::NotAuthenticated));
    }
}
