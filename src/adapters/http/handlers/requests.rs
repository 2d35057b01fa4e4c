//! Student and tutor pages: dashboards, request submission, listing and cancellation.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use crate::adapters::http::AppState;
use crate::adapters::http::auth::{CurrentUser, StudentUser, TutorUser};
use crate::adapters::http::error::{AppError, flash_redirect};
use crate::adapters::http::page::render;
use crate::adapters::http::session::Session;
use crate::domain::forms::{StudentRequestForm, TutorRequestForm};
use crate::domain::{DayOfWeek, Frequency, Level};
use crate::ports::Flash;
use crate::usecases::request_service::{
    REQUEST_CANCELLED, STUDENT_REQUEST_SUBMITTED, TUTOR_REQUEST_SUBMITTED,
};

const STUDENT_DASHBOARD: &str = "/student/dashboard/";
const TUTOR_DASHBOARD: &str = "/tutor/dashboard/";

pub async fn student_dashboard(
    StudentUser(user): StudentUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let dashboard = state.services.analytics.student_dashboard(&user).await?;
    Ok(render("student_dashboard", &session, Some(&user), dashboard))
}

/// Any logged-in user may ask; only those with a student profile get a list.
pub async fn student_invoices(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let invoices = state
        .services
        .invoices
        .student_invoices(&user)
        .await
        .map_err(AppError::bounce("/"))?;
    Ok(render(
        "student_invoices",
        &session,
        Some(&user),
        json!({ "invoices": invoices }),
    ))
}

pub async fn student_request_page(StudentUser(user): StudentUser, session: Session) -> Response {
    render(
        "submit_student_request",
        &session,
        Some(&user),
        json!({
            "days": DayOfWeek::ALL,
            "frequencies": Frequency::ALL,
            "difficulties": Level::ALL,
        }),
    )
}

pub async fn submit_student_request(
    StudentUser(user): StudentUser,
    State(state): State<AppState>,
    Form(form): Form<StudentRequestForm>,
) -> Result<Response, AppError> {
    state
        .services
        .requests
        .submit_student_request(&user, &form)
        .await?;
    Ok(flash_redirect(
        STUDENT_DASHBOARD,
        Flash::success(STUDENT_REQUEST_SUBMITTED),
    ))
}

pub async fn student_requests(
    StudentUser(user): StudentUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let requests = state.services.requests.student_requests_of(&user).await?;
    Ok(render(
        "student_requests",
        &session,
        Some(&user),
        json!({ "requests": requests }),
    ))
}

/// Requests of other users read as missing, whatever the caller's role.
pub async fn cancel_student_request(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state
        .services
        .requests
        .cancel_student_request(&user, id)
        .await
        .map_err(AppError::bounce(STUDENT_DASHBOARD))?;
    Ok(flash_redirect(
        STUDENT_DASHBOARD,
        Flash::success(REQUEST_CANCELLED),
    ))
}

pub async fn tutor_dashboard(
    TutorUser(user): TutorUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let dashboard = state.services.analytics.tutor_dashboard(&user).await?;
    Ok(render("tutor_dashboard", &session, Some(&user), dashboard))
}

pub async fn tutor_request_page(TutorUser(user): TutorUser, session: Session) -> Response {
    render(
        "submit_tutor_request",
        &session,
        Some(&user),
        json!({
            "days": DayOfWeek::ALL,
            "levels": Level::ALL,
        }),
    )
}

pub async fn submit_tutor_request(
    TutorUser(user): TutorUser,
    State(state): State<AppState>,
    Form(form): Form<TutorRequestForm>,
) -> Result<Response, AppError> {
    state
        .services
        .requests
        .submit_tutor_request(&user, &form)
        .await?;
    Ok(flash_redirect(
        TUTOR_DASHBOARD,
        Flash::success(TUTOR_REQUEST_SUBMITTED),
    ))
}

pub async fn tutor_requests(
    TutorUser(user): TutorUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let requests = state.services.requests.tutor_requests_of(&user).await?;
    Ok(render(
        "tutor_requests",
        &session,
        Some(&user),
        json!({ "requests": requests }),
    ))
}

pub async fn cancel_tutor_request(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state
        .services
        .requests
        .cancel_tutor_request(&user, id)
        .await
        .map_err(AppError::bounce(TUTOR_DASHBOARD))?;
    Ok(flash_redirect(TUTOR_DASHBOARD, Flash::success(REQUEST_CANCELLED)))
}
