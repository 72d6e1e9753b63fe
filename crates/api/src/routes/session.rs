//! Login Surface
//!
//! Thin wrappers over the session store. Credential policy and the login
//! page itself belong to external collaborators; these routes only issue
//! and revoke the cookie the access gate checks.

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use session_gate::{session_token, verify_password, OperatorIdentity, SESSION_COOKIE};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST `/login` — verify credentials, start a session, hand the browser
/// its cookie. Failures bounce back to the login page with an error flag
/// and no detail about which half was wrong.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let ok = body.username == state.operator.username
        && verify_password(&body.password, &state.operator.password_sha256);
    if !ok {
        warn!(username = %body.username, "rejected login attempt");
        let target = format!("{}?error=1", state.login_redirect);
        return Redirect::to(&target).into_response();
    }

    let token = state.sessions.issue(OperatorIdentity::new(body.username.clone()));
    info!(username = %body.username, "operator logged in");

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    (
        [(SET_COOKIE, cookie)],
        Redirect::to(&state.dashboard_redirect),
    )
        .into_response()
}

/// GET `/logout` — revoke the session (if any) and clear the cookie.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_token)
    {
        state.sessions.revoke(token);
    }

    let clear = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    ([(SET_COOKIE, clear)], Redirect::to(&state.login_redirect)).into_response()
}
