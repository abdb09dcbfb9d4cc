//! Maps admission and infrastructure errors onto HTTP responses with a
//! `{"error": {"code", "kind", "message"}}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certfeed_types::{CertfeedError, RejectReason};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub kind: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Rejected(RejectReason),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Logged, never returned to the client verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

pub fn rejection_status(reason: RejectReason) -> StatusCode {
    match reason {
        RejectReason::MalformedInput | RejectReason::EmptyProof => StatusCode::BAD_REQUEST,
        RejectReason::ProofMismatch
        | RejectReason::WrongSignature
        | RejectReason::InvalidProof
        | RejectReason::InactiveCredential => StatusCode::UNPROCESSABLE_ENTITY,
        RejectReason::DuplicateNullifier => StatusCode::CONFLICT,
        RejectReason::VerifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Rejected(reason) => (rejection_status(*reason), reason.kind()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        }
    }
}

impl From<CertfeedError> for AppError {
    fn from(err: CertfeedError) -> Self {
        match err {
            CertfeedError::Rejected(reason) => Self::Rejected(reason),
            CertfeedError::InvalidInput(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: status.as_u16(),
                kind: kind.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
