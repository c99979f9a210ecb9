//! services/api/src/web/users.rs
//!
//! Staff account management. Routes here sit behind `require_auth` and
//! `require_admin`.

use crate::web::error::port_error_response;
use crate::web::rest::{CreatedResponse, UserResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use cinema_core::domain::{NewUser, User};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    pub full_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All staff accounts", body = [UserResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let users = state
        .db
        .list_users()
        .await
        .map_err(|e| port_error_response(e, "list users"))?;
    let body: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedResponse),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = NewUser {
        username: req.username,
        password: req.password,
        role: req.role,
        full_name: req.full_name,
    };
    user.validate()
        .map_err(|e| port_error_response(e, "add user"))?;

    let username = user.username.clone();
    let id = state
        .db
        .add_user(user)
        .await
        .map_err(|e| port_error_response(e, "add user"))?;

    info!("{} created account {} ({})", admin.username, username, id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    if admin.id == user_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Cannot delete the signed-in account".to_string(),
        ));
    }

    let matched = state
        .db
        .delete_user(user_id)
        .await
        .map_err(|e| port_error_response(e, "delete user"))?;

    if !matched {
        return Err((StatusCode::NOT_FOUND, format!("User {} not found", user_id)));
    }
    info!("{} deleted account {}", admin.username, user_id);
    Ok(StatusCode::NO_CONTENT)
}
