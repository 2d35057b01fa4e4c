use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::session::Session;
use crate::domain::{Role, User};
use crate::ports::Flash;

/// The logged-in user as shown on every page.
#[derive(Debug, Serialize)]
pub struct PageUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub gravatar: String,
    pub mini_gravatar: String,
}

impl From<&User> for PageUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            email: user.email.clone(),
            role: user.role,
            gravatar: user.default_gravatar(),
            mini_gravatar: user.mini_gravatar(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub page: &'static str,
    pub user: Option<PageUser>,
    pub messages: Vec<Flash>,
    pub data: T,
}

/// JSON page `name`, draining the session's pending messages into it.
pub fn render<T: Serialize>(
    name: &'static str,
    session: &Session,
    user: Option<&User>,
    data: T,
) -> Response {
    Json(Page {
        page: name,
        user: user.map(PageUser::from),
        messages: session.take_flashes(),
        data,
    })
    .into_response()
}
