//! services/api/src/web/manage.rs
//!
//! Write endpoints for staff: catalog maintenance and the ticket desk.
//! Every route here sits behind `require_auth`.

use crate::web::error::port_error_response;
use crate::web::rest::CreatedResponse;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{NaiveDate, NaiveTime};
use cinema_core::domain::{NewMovie, NewScreening, NewTariff, NewTicket, User};
use cinema_core::ports::PortError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateMovieRequest {
    pub title: String,
    pub duration: i32,
    pub genre: Option<String>,
    pub age_rating: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub movie_id: i32,
    pub hall_id: i32,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub tariff_id: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTariffRequest {
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct BuyTicketRequest {
    pub session_id: i32,
    pub seat_id: i32,
    pub customer_name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub payment_method: String,
}

/// 204 when the statement matched a row, 404 otherwise.
fn removed_or_not_found(
    matched: bool,
    what: &str,
    id: i32,
) -> Result<StatusCode, (StatusCode, String)> {
    if matched {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("{} {} not found", what, id)))
    }
}

fn created(id: i32) -> (StatusCode, Json<CreatedResponse>) {
    (StatusCode::CREATED, Json(CreatedResponse { id }))
}

//=========================================================================================
// Movies
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/movies",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = CreatedResponse),
        (status = 400, description = "Invalid movie"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_movie_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movie = NewMovie {
        title: req.title,
        duration: req.duration,
        genre: req.genre,
        age_rating: req.age_rating,
    };
    movie
        .validate()
        .map_err(|e| port_error_response(e, "add movie"))?;

    let id = state
        .db
        .add_movie(movie)
        .await
        .map_err(|e| port_error_response(e, "add movie"))?;

    info!("{} added movie {}", user.username, id);
    Ok(created(id))
}

#[utoipa::path(
    delete,
    path = "/api/movies/{id}",
    params(("id" = i32, Path, description = "Movie id")),
    responses(
        (status = 204, description = "Movie deleted"),
        (status = 404, description = "No such movie"),
        (status = 409, description = "Movie is still scheduled")
    )
)]
pub async fn delete_movie_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(movie_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let matched = state
        .db
        .delete_movie(movie_id)
        .await
        .map_err(|e| port_error_response(e, "delete movie"))?;

    if matched {
        info!("{} deleted movie {}", user.username, movie_id);
    }
    removed_or_not_found(matched, "Movie", movie_id)
}

//=========================================================================================
// Screenings
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Screening scheduled", body = CreatedResponse),
        (status = 400, description = "Invalid screening"),
        (status = 409, description = "Unknown movie, hall or tariff")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let screening = NewScreening {
        movie_id: req.movie_id,
        hall_id: req.hall_id,
        session_date: req.session_date,
        start_time: req.start_time,
        end_time: req.end_time,
        tariff_id: req.tariff_id,
    };
    screening
        .validate()
        .map_err(|e| port_error_response(e, "add session"))?;

    let id = state
        .db
        .add_screening(screening)
        .await
        .map_err(|e| port_error_response(e, "add session"))?;

    info!("{} scheduled session {}", user.username, id);
    Ok(created(id))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = i32, Path, description = "Screening id")),
    responses(
        (status = 204, description = "Screening deleted"),
        (status = 404, description = "No such screening")
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let matched = state
        .db
        .delete_screening(session_id)
        .await
        .map_err(|e| port_error_response(e, "delete session"))?;

    if matched {
        info!("{} deleted session {}", user.username, session_id);
    }
    removed_or_not_found(matched, "Session", session_id)
}

//=========================================================================================
// Tariffs
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/tariffs",
    request_body = CreateTariffRequest,
    responses(
        (status = 201, description = "Tariff created", body = CreatedResponse),
        (status = 400, description = "Invalid tariff")
    )
)]
pub async fn create_tariff_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateTariffRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tariff = NewTariff {
        name: req.name,
        price: req.price,
    };
    tariff
        .validate()
        .map_err(|e| port_error_response(e, "add tariff"))?;

    let id = state
        .db
        .add_tariff(tariff)
        .await
        .map_err(|e| port_error_response(e, "add tariff"))?;

    info!("{} added tariff {}", user.username, id);
    Ok(created(id))
}

#[utoipa::path(
    delete,
    path = "/api/tariffs/{id}",
    params(("id" = i32, Path, description = "Tariff id")),
    responses(
        (status = 204, description = "Tariff deleted"),
        (status = 404, description = "No such tariff")
    )
)]
pub async fn delete_tariff_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(tariff_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let matched = state
        .db
        .delete_tariff(tariff_id)
        .await
        .map_err(|e| port_error_response(e, "delete tariff"))?;

    if matched {
        info!("{} deleted tariff {}", user.username, tariff_id);
    }
    removed_or_not_found(matched, "Tariff", tariff_id)
}

//=========================================================================================
// Tickets
//=========================================================================================

/// Sell a seat for a screening.
///
/// No availability check is made here; a seat that already has a live ticket
/// is rejected by the database and reported as 409.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = BuyTicketRequest,
    responses(
        (status = 201, description = "Ticket sold", body = CreatedResponse),
        (status = 409, description = "Seat already sold, or unknown screening/seat")
    )
)]
pub async fn buy_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<BuyTicketRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let ticket = NewTicket {
        session_id: req.session_id,
        seat_id: req.seat_id,
        customer_name: req.customer_name,
        price: req.price,
        payment_method: req.payment_method,
    };
    ticket
        .validate()
        .map_err(|e| port_error_response(e, "sell ticket"))?;

    let id = state.db.buy_ticket(ticket).await.map_err(|e| match e {
        PortError::Conflict(_) => (
            StatusCode::CONFLICT,
            "Seat is already sold or the session/seat does not exist".to_string(),
        ),
        other => port_error_response(other, "sell ticket"),
    })?;

    info!("{} sold ticket {}", user.username, id);
    Ok(created(id))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/return",
    params(("id" = i32, Path, description = "Ticket id")),
    responses(
        (status = 204, description = "Ticket returned"),
        (status = 404, description = "No such ticket")
    )
)]
pub async fn return_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let matched = state
        .db
        .return_ticket(ticket_id)
        .await
        .map_err(|e| port_error_response(e, "return ticket"))?;

    if matched {
        info!("{} returned ticket {}", user.username, ticket_id);
    }
    removed_or_not_found(matched, "Ticket", ticket_id)
}
