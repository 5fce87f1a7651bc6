//! Error boundary for the HTTP handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::car::ErrorResponse;
use crate::model::ModelError;

/// Everything a request can fail with.
///
/// Only an empty body is a client error. Every other failure is reported as
/// a 500 carrying the underlying message untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No input data provided")]
    NoInput,

    #[error("{0}")]
    Processing(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoInput => StatusCode::BAD_REQUEST,
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self::Processing(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Processing(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::NoInput => warn!("Rejected prediction request without input"),
            Self::Processing(message) => error!(error = %message, "Prediction failed"),
        }
        let body = ErrorResponse { error: self.to_string() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::NoInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Processing("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn model_errors_keep_their_message() {
        let err: ApiError = ModelError::ContainsNan.into();
        assert_eq!(err.to_string(), "Input contains NaN");
    }
}
