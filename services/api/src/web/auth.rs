//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for staff login and logout, plus the task that
//! clears expired login sessions.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use cinema_core::domain::{AuthSession, User};
use cinema_core::ports::DatabaseService;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::web::error::port_error_response;
use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::rest::UserResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(config: &Config, token: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Login with a staff account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Check username and password together
    let user = state
        .db
        .authenticate(&req.username, &req.password)
        .await
        .map_err(|e| port_error_response(e, "authenticate"))?
        .ok_or_else(|| {
            warn!("Rejected login for '{}'", req.username);
            (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            )
        })?;

    // 2. Persist a fresh login session
    let ttl = state.config.session_ttl;
    let session = AuthSession {
        token: Uuid::new_v4().to_string(),
        user_id: user.id,
        expires_at: Utc::now() + ttl,
    };
    state
        .db
        .create_auth_session(&session)
        .await
        .map_err(|e| port_error_response(e, "create login session"))?;

    info!("User '{}' signed in", user.username);

    // 3. Hand the token to the browser
    let cookie = session_cookie(&state.config, &session.token, ttl.num_seconds());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from(user)),
    ))
}

/// POST /auth/logout - Logout and invalidate the login session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_token(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(token)
        .await
        .map_err(|e| port_error_response(e, "logout"))?;

    let cookie = session_cookie(&state.config, "", 0);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

//=========================================================================================
// Background Cleanup
//=========================================================================================

/// Deletes expired login sessions every `period`. Runs until the process exits.
pub async fn purge_expired_sessions(db: Arc<dyn DatabaseService>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        match db.purge_expired_auth_sessions().await {
            Ok(0) => {}
            Ok(removed) => info!("Purged {} expired login sessions", removed),
            Err(e) => error!("Failed to purge expired login sessions: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_secure_only_when_configured() {
        let mut config = Config::from_lookup(|_| None).unwrap();
        let cookie = session_cookie(&config, "tok", 60);
        assert_eq!(cookie, "session_id=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=60");

        config.cookie_secure = true;
        assert!(session_cookie(&config, "tok", 60).ends_with("; Secure"));
    }
}
