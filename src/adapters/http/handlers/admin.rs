use axum::{extract::State, response::Response};
use serde_json::json;

use crate::adapters::http::AppState;
use crate::adapters::http::auth::AdminUser;
use crate::adapters::http::error::AppError;
use crate::adapters::http::page::render;
use crate::adapters::http::session::Session;

pub async fn admin_dashboard(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let dashboard = state.services.analytics.admin_dashboard().await?;
    Ok(render("admin_dashboard", &session, Some(&admin), dashboard))
}

pub async fn admin_analytics(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let analytics = state.services.analytics.analytics().await?;
    Ok(render("admin_analytics", &session, Some(&admin), analytics))
}

pub async fn request_list(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let list = state.services.analytics.request_list().await?;
    Ok(render("request_list", &session, Some(&admin), list))
}

pub async fn admin_feedback(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let feedback = state.services.feedback.list().await?;
    Ok(render(
        "admin_feedback",
        &session,
        Some(&admin),
        json!({ "feedback": feedback }),
    ))
}
