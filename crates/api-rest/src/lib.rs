//! # API REST
//!
//! REST API for Glyco, serving the mock auth, inference and model-registry collaborators.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, bearer tokens, status codes, CORS)
//!
//! The route table matches what `glyco_core::HttpBackend` expects, so a client built with
//! `GlycoClient::http` works against this router unchanged.

#![warn(rust_2018_idioms)]

mod error;

pub use error::ApiError;

use axum::{
    extract::{Path as AxumPath, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use glyco_core::http::{ErrorBody, LoginRequest, RegisterRequest};
use glyco_core::{
    AuthBackend, AuthGrant, CoreConfig, Credential, EmailAddress, FeatureAttribution, GlycoError,
    GlycoResult, HealthMetricsRecord, Identity, InferenceBackend, MockAuthBackend, MockInference,
    ModelDescriptor, ModelRegistry, ModelStatus, NonEmptyText, PredictionId, RiskAssessment,
    RiskLevel, Role, SessionToken, StaticModelRegistry, UserId, View,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct AppState {
    auth: Arc<MockAuthBackend>,
    inference: Arc<MockInference>,
    registry: Arc<StaticModelRegistry>,
}

impl AppState {
    /// State over fresh mock collaborators configured from `config`.
    pub fn mock(config: &CoreConfig) -> GlycoResult<Self> {
        Ok(Self {
            auth: Arc::new(MockAuthBackend::new(config.mock_auth_delay())),
            inference: Arc::new(MockInference::random(
                config.mock_predict_delay(),
                config.decision_threshold(),
            )),
            registry: Arc::new(StaticModelRegistry::reference()?),
        })
    }

    pub fn new(
        auth: Arc<MockAuthBackend>,
        inference: Arc<MockInference>,
        registry: Arc<StaticModelRegistry>,
    ) -> Self {
        Self {
            auth,
            inference,
            registry,
        }
    }

    pub fn auth(&self) -> &MockAuthBackend {
        &self.auth
    }

    /// Resolves the request's bearer token to the credential it was issued for.
    fn credential(&self, headers: &HeaderMap) -> Result<Credential, ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| SessionToken::new(token.trim()).ok())
            .ok_or(ApiError::Unauthorized)?;
        let identity = self
            .auth
            .identity_for_token(&token)
            .ok_or(ApiError::Unauthorized)?;
        Ok(Credential { identity, token })
    }
}

/// Patients may only read their own assessments.
fn ensure_may_read(identity: &Identity, subject: &UserId, view: View) -> Result<(), ApiError> {
    if identity.role == Role::Patient && &identity.id != subject {
        return Err(GlycoError::Forbidden {
            role: identity.role,
            view,
        }
        .into());
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        register,
        logout,
        predict,
        get_prediction,
        user_predictions,
        models,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        LoginRequest,
        RegisterRequest,
        AuthGrant,
        Identity,
        Role,
        HealthMetricsRecord,
        RiskAssessment,
        RiskLevel,
        FeatureAttribution,
        ModelDescriptor,
        ModelStatus,
    ))
)]
struct ApiDoc;

/// Builds the REST router over `state`, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/predict", post(predict))
        .route("/predictions/:id", get(get_prediction))
        .route("/users/:id/predictions", get(user_predictions))
        .route("/models", get(models))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Glyco REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthGrant),
        (status = 400, description = "Malformed email", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
/// Sign in. Unknown emails are signed in as a new patient.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthGrant>, ApiError> {
    let email = parse_email(&req.email)?;
    let grant = state.auth.login(&email, &req.password).await?;
    Ok(Json(grant))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthGrant),
        (status = 400, description = "Malformed email or name", body = ErrorBody),
        (status = 401, description = "An account already exists for this email", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthGrant>), ApiError> {
    let email = parse_email(&req.email)?;
    let name = NonEmptyText::new(&req.name)
        .map_err(|_| GlycoError::InvalidInput("name is required".into()))?;
    let grant = state.auth.register(&email, &req.password, &name).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let credential = state.credential(&headers)?;
    state.auth.logout(&credential.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body = HealthMetricsRecord,
    responses(
        (status = 200, description = "Risk assessment", body = RiskAssessment),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorBody),
        (status = 422, description = "A metric is outside its valid range", body = ErrorBody)
    )
)]
/// Predict diabetes risk for the signed-in subject.
#[axum::debug_handler]
async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(metrics): Json<HealthMetricsRecord>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let credential = state.credential(&headers)?;
    metrics.validate()?;
    let assessment = state.inference.predict(&credential, &metrics).await?;
    tracing::info!(
        "prediction {} for {}: {}",
        assessment.id,
        assessment.user_id,
        assessment.risk_level
    );
    Ok(Json(assessment))
}

#[utoipa::path(
    get,
    path = "/predictions/{id}",
    params(
        ("id" = String, Path, description = "Assessment id")
    ),
    responses(
        (status = 200, description = "Risk assessment", body = RiskAssessment),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 403, description = "Assessment belongs to another patient", body = ErrorBody),
        (status = 404, description = "No such assessment", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_prediction(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let credential = state.credential(&headers)?;
    let id = PredictionId::parse(&id)?;
    let assessment = state
        .inference
        .assessment(&credential, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    ensure_may_read(&credential.identity, &assessment.user_id, View::Results)?;
    Ok(Json(assessment))
}

#[utoipa::path(
    get,
    path = "/users/{id}/predictions",
    params(
        ("id" = String, Path, description = "Subject identity id")
    ),
    responses(
        (status = 200, description = "Assessments, newest first", body = [RiskAssessment]),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 403, description = "Patients may only list their own history", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn user_predictions(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<RiskAssessment>>, ApiError> {
    let credential = state.credential(&headers)?;
    let subject = UserId::parse(&id)?;
    ensure_may_read(&credential.identity, &subject, View::History)?;
    let history = state.inference.history(&credential, &subject).await?;
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/models",
    responses(
        (status = 200, description = "Deployed models", body = [ModelDescriptor])
    )
)]
#[axum::debug_handler]
async fn models(State(state): State<AppState>) -> Result<Json<Vec<ModelDescriptor>>, ApiError> {
    Ok(Json(state.registry.models().await?))
}

fn parse_email(email: &str) -> Result<EmailAddress, ApiError> {
    EmailAddress::parse(email).map_err(|e| GlycoError::InvalidInput(e.to_string()).into())
}
