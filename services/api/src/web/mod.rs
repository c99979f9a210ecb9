pub mod auth;
pub mod error;
pub mod manage;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use middleware::{require_admin, require_auth};
use rest::ApiDoc;
use state::AppState;

/// An empty origin list allows any origin without credentials; a configured
/// list allows credentials for exactly those origins.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("CORS: ignoring invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

/// Builds the complete application: pages, JSON API, static files and Swagger UI.
pub fn app_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(pages::index_page))
        .route("/schedule", get(pages::schedule_page))
        .route("/login", get(pages::login_page))
        .route("/health", get(rest::health_handler))
        .route("/api/movies", get(rest::list_movies_handler))
        .route("/api/sessions", get(rest::list_sessions_handler))
        .route("/api/sessions/{id}", get(rest::get_session_handler))
        .route("/api/sessions/{id}/tickets", get(rest::sold_tickets_handler))
        .route("/api/tariffs", get(rest::list_tariffs_handler))
        .route("/api/halls", get(rest::list_halls_handler))
        .route("/api/halls/{id}/seats", get(rest::list_seats_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Staff routes (auth required)
    let staff_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/api/movies", post(manage::create_movie_handler))
        .route("/api/movies/{id}", delete(manage::delete_movie_handler))
        .route("/api/sessions", post(manage::create_session_handler))
        .route("/api/sessions/{id}", delete(manage::delete_session_handler))
        .route("/api/tariffs", post(manage::create_tariff_handler))
        .route("/api/tariffs/{id}", delete(manage::delete_tariff_handler))
        .route("/api/tickets", post(manage::buy_ticket_handler))
        .route("/api/tickets/{id}/return", post(manage::return_ticket_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes (auth and admin role required)
    let admin_routes = Router::new()
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route("/api/users/{id}", delete(users::delete_user_handler))
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
