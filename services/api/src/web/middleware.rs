//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use cinema_core::domain::User;
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::error::port_error_status;
use crate::web::state::AppState;

/// Name of the cookie carrying the login token.
pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the login token from the `Cookie` header, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        c.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|token| !token.is_empty())
    })
}

/// Resolves the signed-in user for pages that render either way.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = session_token(headers)?;
    match state.db.validate_auth_session(token).await {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("Ignoring login cookie: {}", e);
            None
        }
    }
}

/// Middleware that validates the login cookie and resolves the user.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .db
        .validate_auth_session(token)
        .await
        .map_err(|e| {
            let status = port_error_status(&e);
            if status.is_server_error() {
                error!("Failed to validate auth session: {:?}", e);
            }
            status
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware that only lets admins through. Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, StatusCode> {
    let is_admin = req
        .extensions()
        .get::<User>()
        .map(User::is_admin)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !is_admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn finds_token_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; session_id=abc-123; lang=ru");
        assert_eq!(session_token(&headers), Some("abc-123"));
    }

    #[test]
    fn ignores_similar_names_and_empty_values() {
        assert_eq!(session_token(&headers_with_cookie("session_idx=abc")), None);
        assert_eq!(session_token(&headers_with_cookie("session_id=")), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
