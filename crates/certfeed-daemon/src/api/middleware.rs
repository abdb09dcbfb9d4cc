use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use certfeed_crypto::constant_time_eq;
use tracing::warn;

use super::error::AppError;
use super::server::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated,
    /// No admin token configured; admin routes are closed.
    Disabled,
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

/// Bearer-token check for operator routes.
pub struct AdminAuth {
    token: Option<String>,
}

impl AdminAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn authenticate(&self, auth_header: Option<&str>) -> AuthResult {
        let Some(expected) = &self.token else {
            return AuthResult::Disabled;
        };
        let Some(header) = auth_header else {
            return AuthResult::MissingToken;
        };
        let Some(provided) = header.strip_prefix("Bearer ") else {
            return AuthResult::InvalidFormat;
        };
        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            AuthResult::Authenticated
        } else {
            AuthResult::InvalidToken
        }
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.auth.authenticate(header) {
        AuthResult::Authenticated => Ok(next.run(request).await),
        AuthResult::Disabled => Err(AppError::Forbidden(
            "root publication is disabled; no admin token configured".into(),
        )),
        AuthResult::MissingToken => Err(AppError::Unauthorized("missing bearer token".into())),
        AuthResult::InvalidFormat => Err(AppError::Unauthorized("expected `Bearer <token>`".into())),
        AuthResult::InvalidToken => {
            warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
            Err(AppError::Unauthorized("invalid token".into()))
        }
    }
}
