//! `GlycoClient`: the wired-up core a presentation layer talks to.

use crate::assessment::RiskAssessment;
use crate::auth::{AuthBackend, MockAuthBackend};
use crate::config::CoreConfig;
use crate::gateway::{InferenceBackend, PredictionGateway};
use crate::handoff::ResultHandoff;
use crate::history::{export_csv, export_file_name, filter_history};
use crate::http::HttpBackend;
use crate::identity::View;
use crate::ids::PredictionId;
use crate::inference::MockInference;
use crate::metrics::HealthMetricsRecord;
use crate::model::{ModelDescriptor, ModelRegistry, StaticModelRegistry};
use crate::service::PredictionService;
use crate::session::SessionStore;
use crate::storage::{FileStore, MemoryStore};
use crate::GlycoResult;
use chrono::Utc;
use std::sync::Arc;

pub struct GlycoClient {
    session: Arc<SessionStore>,
    gateway: Arc<PredictionGateway>,
    handoff: Arc<ResultHandoff>,
    predictions: PredictionService,
}

impl GlycoClient {
    /// Client over the in-process mock collaborators.
    pub async fn mock(config: &CoreConfig) -> GlycoResult<Self> {
        let auth = Arc::new(MockAuthBackend::new(config.mock_auth_delay()));
        let inference = Arc::new(MockInference::random(
            config.mock_predict_delay(),
            config.decision_threshold(),
        ));
        let registry = Arc::new(StaticModelRegistry::reference()?);
        Self::with_backends(config, auth, inference, registry).await
    }

    /// Client over a remote service at `base_url`.
    pub async fn http(config: &CoreConfig, base_url: &str) -> GlycoResult<Self> {
        let backend = Arc::new(HttpBackend::new(base_url, config.predict_timeout())?);
        Self::with_backends(config, backend.clone(), backend.clone(), backend).await
    }

    /// Wires the given collaborators and restores any persisted session before returning.
    pub async fn with_backends(
        config: &CoreConfig,
        auth: Arc<dyn AuthBackend>,
        inference: Arc<dyn InferenceBackend>,
        registry: Arc<dyn ModelRegistry>,
    ) -> GlycoResult<Self> {
        let durable = Arc::new(FileStore::open(config.session_file())?);
        let session = Arc::new(SessionStore::new(auth, durable));
        session.restore().await;

        let gateway = Arc::new(PredictionGateway::new(inference, registry, config));
        let handoff = Arc::new(ResultHandoff::new(Arc::new(MemoryStore::new())));
        let predictions = PredictionService::new(session.clone(), gateway.clone(), handoff.clone());

        Ok(Self {
            session,
            gateway,
            handoff,
            predictions,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn gateway(&self) -> &PredictionGateway {
        &self.gateway
    }

    pub async fn submit(&self, metrics: HealthMetricsRecord) -> GlycoResult<RiskAssessment> {
        self.predictions.submit(metrics).await
    }

    /// The result handed over by the last successful submit or [`GlycoClient::open_result`].
    pub fn latest_result(&self) -> Option<RiskAssessment> {
        self.handoff.latest()
    }

    /// Hands a stored assessment (e.g. picked from history) to the results view.
    pub fn open_result(&self, assessment: &RiskAssessment) -> GlycoResult<()> {
        self.session.require(View::Results)?;
        self.handoff.publish(assessment)
    }

    /// The signed-in subject's assessments, newest first.
    pub async fn history(&self) -> GlycoResult<Vec<RiskAssessment>> {
        let credential = self.session.require(View::History)?;
        self.gateway
            .get_history(&credential, &credential.identity.id)
            .await
    }

    /// History entries whose id or risk level matches `term`. A blank term keeps everything.
    pub async fn search_history(&self, term: &str) -> GlycoResult<Vec<RiskAssessment>> {
        let history = self.history().await?;
        Ok(filter_history(&history, term).into_iter().cloned().collect())
    }

    /// The matching history as CSV, with the dated file name to save it under.
    pub async fn export_history_csv(&self, term: &str) -> GlycoResult<(String, String)> {
        let history = self.history().await?;
        let csv = export_csv(filter_history(&history, term));
        Ok((export_file_name(Utc::now().date_naive()), csv))
    }

    pub async fn assessment(&self, id: &PredictionId) -> GlycoResult<Option<RiskAssessment>> {
        let credential = self.session.require(View::Results)?;
        self.gateway.get_by_id(&credential, id).await
    }

    pub async fn models(&self) -> GlycoResult<Vec<ModelDescriptor>> {
        self.gateway.model_status().await
    }

    /// Signs out and drops any handed-off result along with the session.
    pub async fn logout(&self) -> GlycoResult<()> {
        let result = self.session.logout().await;
        if let Err(e) = self.handoff.clear() {
            tracing::warn!("failed to clear latest prediction: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pima_sample;
    use crate::GlycoError;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(session_file: &Path) -> CoreConfig {
        let base = CoreConfig::default();
        CoreConfig::new(
            session_file.to_path_buf(),
            Duration::ZERO,
            Duration::ZERO,
            base.predict_timeout(),
            base.decision_threshold(),
            base.read_retry().clone(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn construction_completes_restore() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let client = GlycoClient::mock(&config(&temp_dir.path().join("session.json")))
            .await
            .unwrap();

        assert!(!client.session().state().is_restoring());
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn submit_history_and_logout() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let client = GlycoClient::mock(&config(&temp_dir.path().join("session.json")))
            .await
            .unwrap();

        assert!(matches!(
            client.history().await,
            Err(GlycoError::NotAuthenticated)
        ));

        client.session().login("pat@example.com", "pw").await.unwrap();
        let made = client.submit(pima_sample()).await.unwrap();

        assert_eq!(client.latest_result(), Some(made.clone()));
        assert_eq!(client.history().await.unwrap(), vec![made.clone()]);
        assert_eq!(client.assessment(&made.id).await.unwrap(), Some(made));
        assert_eq!(client.models().await.unwrap().len(), 2);

        client.logout().await.unwrap();
        assert_eq!(client.latest_result(), None);
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn history_entry_can_be_reopened_as_the_latest_result() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let client = GlycoClient::mock(&config(&temp_dir.path().join("session.json")))
            .await
            .unwrap();
        client.session().login("pat@example.com", "pw").await.unwrap();

        let older = client.submit(pima_sample()).await.unwrap();
        let newer = client.submit(pima_sample()).await.unwrap();
        assert_eq!(client.latest_result(), Some(newer));

        let picked = client.history().await.unwrap().pop().unwrap();
        assert_eq!(picked, older);
        client.open_result(&picked).unwrap();
        assert_eq!(client.latest_result(), Some(older));

        client.logout().await.unwrap();
        assert!(matches!(
            client.open_result(&picked),
            Err(GlycoError::NotAuthenticated)
        ));
        assert_eq!(client.latest_result(), None);
    }

    #[tokio::test]
    async fn history_search_and_csv_export() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let client = GlycoClient::mock(&config(&temp_dir.path().join("session.json")))
            .await
            .unwrap();
        assert!(matches!(
            client.export_history_csv("").await,
            Err(GlycoError::NotAuthenticated)
        ));

        client.session().login("pat@example.com", "pw").await.unwrap();
        let first = client.submit(pima_sample()).await.unwrap();
        let second = client.submit(pima_sample()).await.unwrap();

        let found = client.search_history(first.id.as_str()).await.unwrap();
        assert_eq!(found, vec![first.clone()]);

        let (file_name, csv) = client.export_history_csv("").await.unwrap();
        assert!(file_name.starts_with("prediction-history-"));
        assert!(file_name.ends_with(".csv"));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], crate::history::CSV_HEADER);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(second.id.as_str()));
        assert!(lines[2].starts_with(first.id.as_str()));

        let (_, only_first) = client.export_history_csv(first.id.as_str()).await.unwrap();
        assert_eq!(only_first.lines().count(), 2);
    }

    #[tokio::test]
    async fn session_survives_a_new_client_over_the_same_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = config(&temp_dir.path().join("nested").join("session.json"));

        let first = GlycoClient::mock(&cfg).await.unwrap();
        let identity = first.session().login("pat@example.com", "pw").await.unwrap();
        drop(first);

        let second = GlycoClient::mock(&cfg).await.unwrap();
        assert_eq!(second.session().identity(), Some(identity));
        // The handoff is transient and does not survive.
        assert_eq!(second.latest_result(), None);
    }
}
