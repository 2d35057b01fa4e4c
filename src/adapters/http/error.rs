use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::DomainError;
use crate::ports::Flash;

/// Where invalid state transitions land when the handler names no better page.
const FALLBACK_REDIRECT: &str = "/dashboard/";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Redirect to {to}")]
    Redirect { to: String, flash: Option<Flash> },

    #[error("Session layer missing")]
    MissingSession,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Turns an `InvalidState` error into a flashed redirect to `to`. Other errors pass through.
    pub fn bounce(to: impl Into<String>) -> impl FnOnce(DomainError) -> AppError {
        let to = to.into();
        move |e| match e {
            DomainError::InvalidState(text) => AppError::Redirect {
                to,
                flash: Some(Flash::error(text)),
            },
            other => AppError::Domain(other),
        }
    }
}

/// Flash carried on a response. The session layer moves it into the session.
#[derive(Debug, Clone)]
pub struct PendingFlash(pub Flash);

/// 303 to `to`, showing `flash` on the next page.
pub fn flash_redirect(to: &str, flash: Flash) -> Response {
    let mut response = Redirect::to(to).into_response();
    response.extensions_mut().insert(PendingFlash(flash));
    response
}

pub fn log_in_url(next: &str) -> String {
    format!("/log_in/?next={}", urlencoding::encode(next))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let domain = match self {
            AppError::LoginRequired { next } => {
                return Redirect::to(&log_in_url(&next)).into_response();
            }
            AppError::Redirect { to, flash } => {
                return match flash {
                    Some(flash) => flash_redirect(&to, flash),
                    None => Redirect::to(&to).into_response(),
                };
            }
            AppError::MissingSession => {
                error!("request reached a handler without a session");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            AppError::Domain(e) => e,
        };

        let status = match &domain {
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            DomainError::Validation(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": errors })),
                )
                    .into_response();
            }
            DomainError::InvalidState(text) => {
                return flash_redirect(FALLBACK_REDIRECT, Flash::error(text.clone()));
            }
            DomainError::Auth(_) => StatusCode::UNAUTHORIZED,
            DomainError::Repo(e) => {
                error!(error = %e, "store failure");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
            }
        };

        (status, domain.to_string()).into_response()
    }
}
