//! Lesson pages and the admin pairing flow.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use crate::adapters::http::AppState;
use crate::adapters::http::auth::{AdminUser, CurrentUser};
use crate::adapters::http::error::{AppError, flash_redirect};
use crate::adapters::http::page::render;
use crate::adapters::http::session::Session;
use crate::domain::forms::{LessonForm, PAIR_FIELDS_MESSAGE, PairForm};
use crate::domain::{DayOfWeek, DomainError, Frequency, LessonStatus, NON_FIELD};
use crate::ports::Flash;
use crate::usecases::lesson_service::{LESSON_CANCELLED, LESSON_DELETED, LESSON_UPDATED, PAIRED};

const ADMIN_DASHBOARD: &str = "/admin/dashboard/";

pub async fn view_lesson(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let lesson = state.services.lessons.view_lesson(&user, id).await?;
    Ok(render(
        "view_lesson",
        &session,
        Some(&user),
        json!({ "lesson": lesson }),
    ))
}

pub async fn cancel_lesson_page(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let lesson = state.services.lessons.participant_lesson(&user, id).await?;
    Ok(render(
        "cancel_lesson",
        &session,
        Some(&user),
        json!({ "lesson": lesson }),
    ))
}

pub async fn cancel_lesson(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.lessons.cancel_lesson(&user, id).await?;
    Ok(flash_redirect(
        user.dashboard_path(),
        Flash::success(LESSON_CANCELLED),
    ))
}

pub async fn edit_lesson_page(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let lesson = state.services.lessons.lesson(id).await?;
    Ok(render(
        "edit_lesson",
        &session,
        Some(&admin),
        json!({
            "lesson": lesson,
            "days": DayOfWeek::ALL,
            "frequencies": Frequency::ALL,
            "statuses": LessonStatus::ALL,
        }),
    ))
}

pub async fn edit_lesson(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<LessonForm>,
) -> Result<Response, AppError> {
    state.services.lessons.edit_lesson(id, &form).await?;
    Ok(flash_redirect(ADMIN_DASHBOARD, Flash::success(LESSON_UPDATED)))
}

pub async fn delete_lesson(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.lessons.delete_lesson(id).await?;
    Ok(flash_redirect(ADMIN_DASHBOARD, Flash::success(LESSON_DELETED)))
}

pub async fn pair_page(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path((student_request_id, tutor_request_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let (student_request, tutor_request) = state
        .services
        .lessons
        .pairing(student_request_id, tutor_request_id)
        .await?;
    // Other slots the admin may pick instead of the one in the URL.
    let candidates = state
        .services
        .requests
        .match_candidates(&student_request)
        .await?;
    Ok(render(
        "pair_request",
        &session,
        Some(&admin),
        json!({
            "student_request": student_request,
            "tutor_request": tutor_request,
            "candidates": candidates,
        }),
    ))
}

/// Refused pairings flash the reason on the admin dashboard; blank fields send the admin
/// back to the pairing page.
pub async fn pair(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path((student_request_id, tutor_request_id)): Path<(i64, i64)>,
    Form(form): Form<PairForm>,
) -> Result<Response, AppError> {
    match state.services.lessons.pair(student_request_id, &form).await {
        Ok(_) => Ok(flash_redirect(ADMIN_DASHBOARD, Flash::success(PAIRED))),
        Err(DomainError::Validation(errors)) if errors.contains(NON_FIELD, PAIR_FIELDS_MESSAGE) => {
            Ok(flash_redirect(
                &format!("/admin/pair/{student_request_id}/{tutor_request_id}/"),
                Flash::error(PAIR_FIELDS_MESSAGE),
            ))
        }
        Err(e) => Err(AppError::bounce(ADMIN_DASHBOARD)(e)),
    }
}
