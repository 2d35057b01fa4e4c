//! Access-control extractors. Each resolves the session's user and rejects with the
//! matching [`AppError`]: login redirect, 403 for the wrong role, or a bounce to the
//! dashboard for pages meant for visitors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::AppState;
use super::error::AppError;
use super::session::Session;
use crate::domain::{DomainError, Role, User};

async fn session_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let session = Session::from_request_parts(parts, state).await?;
    let Some(id) = session.user_id() else {
        return Ok(None);
    };
    let user = state.services.accounts.find_user(id).await?;
    if user.is_none() {
        // Account deleted while logged in.
        session.log_out();
    }
    Ok(user)
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

async fn logged_in(parts: &mut Parts, state: &AppState) -> Result<User, AppError> {
    session_user(parts, state)
        .await?
        .ok_or_else(|| AppError::LoginRequired {
            next: requested_path(parts),
        })
}

async fn with_role(parts: &mut Parts, state: &AppState, role: Role) -> Result<User, AppError> {
    let user = logged_in(parts, state).await?;
    if user.role != role {
        return Err(DomainError::PermissionDenied(format!("{} accounts only", role.as_str())).into());
    }
    Ok(user)
}

/// Any logged-in user.
pub struct CurrentUser(pub User);

/// The user if one is logged in.
pub struct MaybeUser(pub Option<User>);

pub struct AdminUser(pub User);

pub struct StudentUser(pub User);

pub struct TutorUser(pub User);

/// Pages for visitors only. Logged-in users are sent to their dashboard.
pub struct Anonymous;

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        logged_in(parts, state).await.map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        session_user(parts, state).await.map(MaybeUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        with_role(parts, state, Role::Admin).await.map(AdminUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StudentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        with_role(parts, state, Role::Student).await.map(StudentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TutorUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        with_role(parts, state, Role::Tutor).await.map(TutorUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Anonymous {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match session_user(parts, state).await? {
            Some(user) => Err(AppError::Redirect {
                to: user.dashboard_path().to_string(),
                flash: None,
            }),
            None => Ok(Anonymous),
        }
    }
}
