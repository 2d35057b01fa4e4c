//! Cookie sessions: login state and flash messages, persisted through the `SessionStore` port.
//!
//! The middleware loads the record named by the cookie, hands a [`Session`] handle to the
//! handlers through request extensions, and writes the record back once the response is built.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::AppState;
use super::error::{AppError, PendingFlash};
use crate::domain::DomainError;
use crate::ports::{Flash, SessionRecord};

pub const SESSION_COOKIE: &str = "tutor_match_session";

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user_id: Option<i64>,
    flashes: Vec<Flash>,
    dirty: bool,
    rotate: bool,
    ended: bool,
}

/// What the middleware must do with the store once the handler is done.
enum Commit {
    Keep,
    End {
        token: Option<String>,
    },
    Save {
        stale: Option<String>,
        token: String,
        record: SessionRecord,
    },
}

/// Per-request session handle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Session(Arc<Mutex<SessionState>>);

impl Session {
    fn loaded(token: Option<String>, record: Option<SessionRecord>) -> Self {
        let (user_id, flashes) = record
            .map(|r| (r.user_id, r.flashes))
            .unwrap_or_default();
        Self(Arc::new(Mutex::new(SessionState {
            token,
            user_id,
            flashes,
            ..SessionState::default()
        })))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.state().user_id
    }

    /// Binds the session to `user_id` under a fresh token.
    pub fn log_in(&self, user_id: i64) {
        let mut state = self.state();
        state.user_id = Some(user_id);
        state.dirty = true;
        state.rotate = true;
        state.ended = false;
    }

    /// Drops the stored session and expires the cookie.
    pub fn log_out(&self) {
        let mut state = self.state();
        state.user_id = None;
        state.flashes.clear();
        state.ended = true;
    }

    pub fn flash(&self, flash: Flash) {
        let mut state = self.state();
        state.flashes.push(flash);
        state.dirty = true;
    }

    /// Pending messages, removed from the session.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut state = self.state();
        if state.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        std::mem::take(&mut state.flashes)
    }

    fn commit(&self, expires_at: DateTime<Utc>) -> Commit {
        let mut state = self.state();
        if state.ended {
            return Commit::End {
                token: state.token.take(),
            };
        }
        if !state.dirty || (state.token.is_none() && state.user_id.is_none() && state.flashes.is_empty()) {
            return Commit::Keep;
        }
        let (stale, token) = match state.token.take() {
            Some(old) if state.rotate => (Some(old), Uuid::new_v4().to_string()),
            Some(current) => (None, current),
            None => (None, Uuid::new_v4().to_string()),
        };
        state.token = Some(token.clone());
        state.dirty = false;
        state.rotate = false;
        Commit::Save {
            stale,
            token,
            record: SessionRecord {
                user_id: state.user_id,
                flashes: state.flashes.clone(),
                expires_at,
            },
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, AppError> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::MissingSession)
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let now = Utc::now();
    let presented = cookie_value(request.headers(), SESSION_COOKIE);
    let record = match &presented {
        Some(token) => match state.sessions.load_session(token, now).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "session load failed; continuing anonymous");
                None
            }
        },
        None => None,
    };
    // Unknown or expired tokens are never reused.
    let token = record.as_ref().and(presented);
    let session = Session::loaded(token, record);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;
    if let Some(PendingFlash(flash)) = response.extensions_mut().remove::<PendingFlash>() {
        session.flash(flash);
    }
    if let Err(e) = persist(&state, &session, &mut response, now).await {
        error!(error = %e, "session save failed");
    }
    response
}

async fn persist(
    state: &AppState,
    session: &Session,
    response: &mut Response,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let cookie = match session.commit(now + state.session_ttl) {
        Commit::Keep => return Ok(()),
        Commit::End { token } => {
            if let Some(token) = token {
                state.sessions.delete_session(&token).await?;
                debug!("session ended");
            }
            session_cookie("", 0, state.cookie_secure)
        }
        Commit::Save {
            stale,
            token,
            record,
        } => {
            if let Some(stale) = stale {
                state.sessions.delete_session(&stale).await?;
            }
            state.sessions.save_session(&token, &record).await?;
            session_cookie(&token, state.session_ttl.num_seconds(), state.cookie_secure)
        }
    };
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| DomainError::Repo(format!("session cookie: {e}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
