//! Home, login/logout, sign-up, password and profile pages.

use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::adapters::http::AppState;
use crate::adapters::http::auth::{Anonymous, CurrentUser};
use crate::adapters::http::error::{AppError, flash_redirect};
use crate::adapters::http::page::render;
use crate::adapters::http::session::Session;
use crate::domain::forms::{LogInForm, PasswordForm, ProfileForm, SignUpForm};
use crate::domain::{DomainError, Role};
use crate::ports::Flash;

pub const PASSWORD_UPDATED: &str = "Password updated!";
pub const PROFILE_UPDATED: &str = "Profile updated!";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

/// Local absolute paths only; anything that could leave the site is dropped.
///
/// Whitespace and control bytes are refused too: browsers strip them (`/\t/host` reads as
/// `//host`), and they are not valid in a `Location` header.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && n.bytes().all(|b| b.is_ascii_graphic())
            && !n.contains('\\')
            && !n.contains("://")
    })
}

pub async fn home(_: Anonymous, session: Session) -> Response {
    render("home", &session, None, json!({}))
}

pub async fn dashboard(CurrentUser(user): CurrentUser) -> Redirect {
    Redirect::to(user.dashboard_path())
}

pub async fn log_in_page(_: Anonymous, session: Session, Query(query): Query<NextQuery>) -> Response {
    render(
        "log_in",
        &session,
        None,
        json!({ "next": query.next.unwrap_or_default() }),
    )
}

pub async fn log_in(
    _: Anonymous,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LogInForm>,
) -> Result<Response, AppError> {
    let username = form.username.clone().unwrap_or_default();
    let password = form.password.clone().unwrap_or_default();
    match state.services.accounts.authenticate(&username, &password).await {
        Ok(user) => {
            session.log_in(user.id);
            let to = safe_next(form.next.as_deref()).unwrap_or(user.dashboard_path());
            Ok(Redirect::to(to).into_response())
        }
        Err(DomainError::Auth(message)) => {
            session.flash(Flash::error(message));
            Ok(render(
                "log_in",
                &session,
                None,
                json!({ "next": form.next.unwrap_or_default(), "username": username }),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn log_out(session: Session) -> Redirect {
    session.log_out();
    Redirect::to("/")
}

pub async fn sign_up_page(_: Anonymous, session: Session) -> Response {
    render("sign_up", &session, None, json!({}))
}

pub async fn tutor_sign_up_page(_: Anonymous, session: Session) -> Response {
    render("tutor_sign_up", &session, None, json!({}))
}

async fn sign_up_as(
    state: &AppState,
    session: &Session,
    form: &SignUpForm,
    role: Role,
) -> Result<Redirect, AppError> {
    let user = state.services.accounts.sign_up(form, role).await?;
    session.log_in(user.id);
    Ok(Redirect::to(user.dashboard_path()))
}

pub async fn sign_up(
    _: Anonymous,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Redirect, AppError> {
    sign_up_as(&state, &session, &form, Role::Student).await
}

pub async fn tutor_sign_up(
    _: Anonymous,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Redirect, AppError> {
    sign_up_as(&state, &session, &form, Role::Tutor).await
}

pub async fn password_page(CurrentUser(user): CurrentUser, session: Session) -> Response {
    render("password", &session, Some(&user), json!({}))
}

pub async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    state.services.accounts.change_password(&user, &form).await?;
    Ok(flash_redirect("/dashboard/", Flash::success(PASSWORD_UPDATED)))
}

pub async fn profile_page(CurrentUser(user): CurrentUser, session: Session) -> Response {
    let form = json!({
        "first_name": &user.first_name,
        "last_name": &user.last_name,
        "username": &user.username,
        "email": &user.email,
    });
    render("profile", &session, Some(&user), json!({ "form": form }))
}

pub async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    state.services.accounts.update_profile(&user, &form).await?;
    Ok(flash_redirect("/dashboard/", Flash::success(PROFILE_UPDATED)))
}
