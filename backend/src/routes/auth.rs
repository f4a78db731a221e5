use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::guard::{self, AuthError, SESSION_COOKIE};
use crate::config::Config;
use crate::models::user::UserResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

type SetCookie = [(HeaderName, String); 1];

/// POST /v1/auth/google/login - verify a Google ID token and start a session
async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<(SetCookie, Json<UserResponse>), (StatusCode, String)> {
    if state.config.google.client_id.is_empty() {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Google client id not configured".to_string(),
        ));
    }

    // Verify the token against our client id
    let identity = state
        .google_verifier
        .verify(&request.id_token)
        .await
        .map_err(|e| {
            tracing::debug!("ID token rejected: {}", e);
            (StatusCode::UNAUTHORIZED, "Invalid Google token".to_string())
        })?;

    let email = identity.email.ok_or((
        StatusCode::BAD_REQUEST,
        "Email not available from Google token".to_string(),
    ))?;
    let name = identity.name.unwrap_or_default();

    // Single atomic insert-or-update keyed by email
    let user = state
        .users
        .upsert_login(&email, &name, identity.picture.as_deref())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let token = state
        .session_codec
        .issue(&user.id, &user.email)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!("Login for {}", user.email);

    let cookie = build_session_cookie(&state.config, &token);
    Ok(([(header::SET_COOKIE, cookie)], Json(user.into())))
}

/// POST /v1/auth/logout - clear the session cookie
///
/// Session tokens are not persisted server-side, so logout is just the
/// cookie going away.
async fn logout(State(state): State<Arc<AppState>>) -> (SetCookie, Json<LogoutResponse>) {
    let cookie = clear_session_cookie(&state.config);
    ([(header::SET_COOKIE, cookie)], Json(LogoutResponse { ok: true }))
}

/// GET /v1/me - user record behind the session cookie
async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user = guard::authenticate(&headers, &state.session_codec, state.users.as_ref())
        .await
        .map_err(|e| match e {
            AuthError::Store(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            other => (StatusCode::UNAUTHORIZED, other.to_string()),
        })?;

    Ok(Json(user.into()))
}

fn build_session_cookie(config: &Config, token: &str) -> String {
    let max_age = config.session.expire_days * 24 * 60 * 60;
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age,
        secure_attr(config)
    )
}

fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        SESSION_COOKIE,
        secure_attr(config)
    )
}

fn secure_attr(config: &Config) -> &'static str {
    if config.env == "prod" {
        "; Secure"
    } else {
        ""
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/auth/google/login", post(google_login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/me", get(me))
        .with_state(state)
}
