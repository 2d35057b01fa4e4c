//! HTTP adapter. axum router over the use cases; pages are JSON documents.
//!
//! Layers, outermost first: request logging, then cookie sessions. Access control lives in
//! the extractors of [`auth`]; errors become responses in [`error`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod page;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::ports::SessionStore;
use crate::usecases::Services;
use handlers::{accounts, admin, feedback, invoices, lessons, requests};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_ttl: chrono::Duration,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        services: Arc<Services>,
        sessions: Arc<dyn SessionStore>,
        session_ttl: chrono::Duration,
        cookie_secure: bool,
    ) -> Self {
        Self {
            services,
            sessions,
            session_ttl,
            cookie_secure,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(accounts::home))
        .route("/dashboard/", get(accounts::dashboard))
        .route("/log_in/", get(accounts::log_in_page).post(accounts::log_in))
        .route("/log_out/", get(accounts::log_out).post(accounts::log_out))
        .route("/sign_up/", get(accounts::sign_up_page).post(accounts::sign_up))
        .route(
            "/tutor_sign_up/",
            get(accounts::tutor_sign_up_page).post(accounts::tutor_sign_up),
        )
        .route(
            "/password/",
            get(accounts::password_page).post(accounts::change_password),
        )
        .route(
            "/profile/",
            get(accounts::profile_page).post(accounts::update_profile),
        )
        .route(
            "/submit-feedback/",
            get(feedback::feedback_page).post(feedback::submit_feedback),
        )
        .route("/student/dashboard/", get(requests::student_dashboard))
        .route("/student/invoices/", get(requests::student_invoices))
        .route(
            "/student/request/",
            get(requests::student_request_page).post(requests::submit_student_request),
        )
        .route("/student/requests/", get(requests::student_requests))
        .route(
            "/student/request/:id/cancel/",
            post(requests::cancel_student_request),
        )
        .route("/tutor/dashboard/", get(requests::tutor_dashboard))
        .route(
            "/tutor/request/",
            get(requests::tutor_request_page).post(requests::submit_tutor_request),
        )
        .route("/tutor/requests/", get(requests::tutor_requests))
        .route(
            "/tutor/request/:id/cancel/",
            post(requests::cancel_tutor_request),
        )
        .route("/lesson/:id/", get(lessons::view_lesson))
        .route(
            "/lesson/:id/cancel/",
            get(lessons::cancel_lesson_page).post(lessons::cancel_lesson),
        )
        .route("/invoices/:id/", get(invoices::view_invoice))
        .route("/invoices/:id/mark_paid/", post(invoices::mark_paid))
        .route("/admin/dashboard/", get(admin::admin_dashboard))
        .route("/admin/analytics/", get(admin::admin_analytics))
        .route(
            "/admin/create_invoice/",
            get(invoices::create_invoice_page).post(invoices::create_invoice),
        )
        .route("/admin/delete-invoice/:id/", post(invoices::delete_invoice))
        .route("/admin/feedback/", get(admin::admin_feedback))
        .route("/admin/invoices/", get(invoices::admin_invoices))
        .route(
            "/admin/lesson/:id/edit/",
            get(lessons::edit_lesson_page).post(lessons::edit_lesson),
        )
        .route("/admin/lesson/:id/delete/", post(lessons::delete_lesson))
        .route("/admin/requests/", get(admin::request_list))
        .route(
            "/admin/pair/:student_request_id/:tutor_request_id/",
            get(lessons::pair_page).post(lessons::pair),
        )
        .layer(from_fn_with_state(state.clone(), session::session_layer))
        .layer(from_fn(logging::log_requests))
        .with_state(state)
}

#[cfg(test)]
mod tests;
