//! HTTP client backend for the auth, inference and model-registry services.
//!
//! One [`HttpBackend`] talks to a single base URL exposing the routes below. Transport failures
//! and unexpected responses are normalised into `GlycoError` here; no `reqwest` error escapes.
//!
//! | Route | Method | Body | Response |
//! |---|---|---|---|
//! | `/login` | POST | [`LoginRequest`] | [`AuthGrant`] |
//! | `/register` | POST | [`RegisterRequest`] | [`AuthGrant`] |
//! | `/logout` | POST | bearer | 204 |
//! | `/predict` | POST | bearer, [`HealthMetricsRecord`] | [`RiskAssessment`] |
//! | `/predictions/{id}` | GET | bearer | [`RiskAssessment`] or 404 |
//! | `/users/{id}/predictions` | GET | bearer | `[RiskAssessment]` |
//! | `/models` | GET | | `[ModelDescriptor]` |
//!
//! Error responses carry an [`ErrorBody`].

use crate::assessment::RiskAssessment;
use crate::auth::AuthBackend;
use crate::gateway::InferenceBackend;
use crate::identity::{AuthGrant, Credential, SessionToken};
use crate::ids::{PredictionId, UserId};
use crate::metrics::HealthMetricsRecord;
use crate::model::{ModelDescriptor, ModelRegistry};
use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use glyco_types::{EmailAddress, NonEmptyText};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// `timeout` bounds every request, including reading the body.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GlycoResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GlycoError::InvalidInput("base URL cannot be empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GlycoError::InvalidInput(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> GlycoError {
        if e.is_timeout() {
            GlycoError::GatewayTimeout(self.timeout)
        } else if e.is_decode() {
            GlycoError::GatewayUnavailable(format!("undecodable response: {}", e))
        } else {
            GlycoError::GatewayUnavailable(e.to_string())
        }
    }

    async fn send(&self, request: RequestBuilder) -> GlycoResult<Response> {
        request.send().await.map_err(|e| self.transport_error(e))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> GlycoResult<T> {
        response.json::<T>().await.map_err(|e| self.transport_error(e))
    }

    /// Passes successful responses through and maps everything else onto an error kind.
    async fn check(&self, response: Response) -> GlycoResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        tracing::warn!("{} responded {}: {}", self.base_url, status, message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::CONFLICT => {
                GlycoError::Authentication(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                GlycoError::InvalidInput(message)
            }
            StatusCode::INTERNAL_SERVER_ERROR => GlycoError::InvalidModelState(message),
            _ => GlycoError::GatewayUnavailable(format!("{}: {}", status, message)),
        })
    }

    async fn authenticate(&self, path: &str, body: &impl Serialize) -> GlycoResult<AuthGrant> {
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        let response = self.check(response).await?;
        self.decode(response).await
    }

    async fn get_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> GlycoResult<T> {
        let request = self
            .client
            .get(self.url(path))
            .bearer_auth(credential.token.as_str());
        let response = self.check(self.send(request).await?).await?;
        self.decode(response).await
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, email: &EmailAddress, password: &str) -> GlycoResult<AuthGrant> {
        let body = LoginRequest {
            email: email.as_str().to_string(),
            password: password.to_string(),
        };
        self.authenticate("/login", &body).await
    }

    async fn register(
        &self,
        email: &EmailAddress,
        password: &str,
        name: &NonEmptyText,
    ) -> GlycoResult<AuthGrant> {
        let body = RegisterRequest {
            email: email.as_str().to_string(),
            password: password.to_string(),
            name: name.as_str().to_string(),
        };
        self.authenticate("/register", &body).await
    }

    async fn logout(&self, token: &SessionToken) -> GlycoResult<()> {
        let request = self
            .client
            .post(self.url("/logout"))
            .bearer_auth(token.as_str());
        self.check(self.send(request).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn predict(
        &self,
        credential: &Credential,
        metrics: &HealthMetricsRecord,
    ) -> GlycoResult<RiskAssessment> {
        let request = self
            .client
            .post(self.url("/predict"))
            .bearer_auth(credential.token.as_str())
            .json(metrics);
        let response = self.check(self.send(request).await?).await?;
        self.decode(response).await
    }

    async fn history(
        &self,
        credential: &Credential,
        subject: &UserId,
    ) -> GlycoResult<Vec<RiskAssessment>> {
        self.get_authorized(&format!("/users/{}/predictions", subject), credential)
            .await
    }

    async fn assessment(
        &self,
        credential: &Credential,
        id: &PredictionId,
    ) -> GlycoResult<Option<RiskAssessment>> {
        let request = self
            .client
            .get(self.url(&format!("/predictions/{}", id)))
            .bearer_auth(credential.token.as_str());
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response).await?;
        self.decode(response).await.map(Some)
    }
}

#[async_trait]
impl ModelRegistry for HttpBackend {
    async fn models(&self) -> GlycoResult<Vec<ModelDescriptor>> {
        let response = self.send(self.client.get(self.url("/models"))).await?;
        let response = self.check(response).await?;
        self.decode(response).await
    }
}
