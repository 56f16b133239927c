use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use glyco_core::http::ErrorBody;
use glyco_core::GlycoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] GlycoError),

    #[error("missing or unknown bearer token")]
    Unauthorized,

    #[error("not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Core(e) => match e {
                GlycoError::Authentication(_) | GlycoError::NotAuthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                GlycoError::Forbidden { .. } => StatusCode::FORBIDDEN,
                GlycoError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                GlycoError::InvalidInput(_) | GlycoError::Text(_) => StatusCode::BAD_REQUEST,
                GlycoError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                GlycoError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
