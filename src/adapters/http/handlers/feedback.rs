use axum::{Form, extract::State, response::Response};
use serde_json::json;

use crate::adapters::http::AppState;
use crate::adapters::http::auth::MaybeUser;
use crate::adapters::http::error::{AppError, flash_redirect};
use crate::adapters::http::page::render;
use crate::adapters::http::session::Session;
use crate::domain::forms::FeedbackForm;
use crate::ports::Flash;
use crate::usecases::feedback_service::FEEDBACK_THANKS;

pub async fn feedback_page(MaybeUser(user): MaybeUser, session: Session) -> Response {
    render("feedback", &session, user.as_ref(), json!({}))
}

/// Visitors land back on the home page, users on their dashboard.
pub async fn submit_feedback(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    state.services.feedback.submit(&form).await?;
    let to = if user.is_some() { "/dashboard/" } else { "/" };
    Ok(flash_redirect(to, Flash::success(FEEDBACK_THANKS)))
}
