//! Invoice viewing, and the admin invoice pages.

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
use crate::domain::forms::InvoiceForm;
use crate::ports::Flash;
use crate::usecases::invoice_service::{INVOICE_CREATED, INVOICE_DELETED, toggled_message};

const ADMIN_DASHBOARD: &str = "/admin/dashboard/";

pub async fn view_invoice(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let invoice = state.services.invoices.view_invoice(&user, id).await?;
    Ok(render(
        "view_invoice",
        &session,
        Some(&user),
        json!({ "invoice": invoice }),
    ))
}

pub async fn mark_paid(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let status = state.services.invoices.toggle_paid(id).await?;
    Ok(flash_redirect(
        ADMIN_DASHBOARD,
        Flash::success(toggled_message(id, status)),
    ))
}

pub async fn admin_invoices(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let overview = state.services.invoices.overview().await?;
    Ok(render("admin_invoices", &session, Some(&admin), overview))
}

pub async fn create_invoice_page(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let overview = state.services.invoices.overview().await?;
    Ok(render(
        "create_invoice",
        &session,
        Some(&admin),
        json!({ "students": overview.students, "tutors": overview.tutors }),
    ))
}

pub async fn create_invoice(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, AppError> {
    state.services.invoices.create_invoice(&form).await?;
    Ok(flash_redirect(ADMIN_DASHBOARD, Flash::success(INVOICE_CREATED)))
}

pub async fn delete_invoice(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.services.invoices.delete_invoice(id).await?;
    Ok(flash_redirect(ADMIN_DASHBOARD, Flash::success(INVOICE_DELETED)))
}
