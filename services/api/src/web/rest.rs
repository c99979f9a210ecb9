//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the public, read-only REST endpoints, their
//! response payloads, and the master definition for the OpenAPI specification.

use crate::web::error::port_error_response;
use crate::web::state::AppState;
use crate::web::{auth, manage, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, NaiveTime};
use cinema_core::domain::{
    Hall, Movie, ScheduleEntry, ScreeningDetail, Seat, SoldTicket, Tariff, User,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_movies_handler,
        list_sessions_handler,
        get_session_handler,
        sold_tickets_handler,
        list_tariffs_handler,
        list_halls_handler,
        list_seats_handler,
        health_handler,
        manage::create_movie_handler,
        manage::delete_movie_handler,
        manage::create_session_handler,
        manage::delete_session_handler,
        manage::create_tariff_handler,
        manage::delete_tariff_handler,
        manage::buy_ticket_handler,
        manage::return_ticket_handler,
        users::list_users_handler,
        users::create_user_handler,
        users::delete_user_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
    ),
    components(
        schemas(
            MovieResponse,
            ScheduleEntryResponse,
            ScreeningDetailResponse,
            TariffResponse,
            HallResponse,
            SeatResponse,
            SoldTicketResponse,
            UserResponse,
            CreatedResponse,
            HealthResponse,
            manage::CreateMovieRequest,
            manage::CreateSessionRequest,
            manage::CreateTariffRequest,
            manage::BuyTicketRequest,
            users::CreateUserRequest,
            auth::LoginRequest,
        )
    ),
    tags(
        (name = "Cinema API", description = "Movies, screenings, tariffs, seats, tickets and staff accounts.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[derive(Serialize, ToSchema)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    /// Running time in minutes.
    pub duration: i32,
    pub genre: Option<String>,
    pub age_rating: Option<String>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            duration: movie.duration,
            genre: movie.genre,
            age_rating: movie.age_rating,
        }
    }
}

/// One schedule row. `date` is `DD.MM.YYYY`, times are `HH:MM`.
#[derive(Serialize, ToSchema)]
pub struct ScheduleEntryResponse {
    pub id: i32,
    pub date: String,
    pub date_raw: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub movie: String,
    pub hall: i32,
    pub tariff_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<ScheduleEntry> for ScheduleEntryResponse {
    fn from(entry: ScheduleEntry) -> Self {
        Self {
            id: entry.id,
            date: format_date(entry.session_date),
            date_raw: entry.session_date,
            start_time: format_time(entry.start_time),
            end_time: format_time(entry.end_time),
            movie: entry.movie,
            hall: entry.hall,
            tariff_name: entry.tariff_name,
            price: entry.price,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TariffResponse {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<Tariff> for TariffResponse {
    fn from(tariff: Tariff) -> Self {
        Self {
            id: tariff.id,
            name: tariff.name,
            price: tariff.price,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HallResponse {
    pub id: i32,
    pub hall_number: i32,
    pub rows_count: i32,
    pub seats_per_row: i32,
}

impl From<Hall> for HallResponse {
    fn from(hall: Hall) -> Self {
        Self {
            id: hall.id,
            hall_number: hall.hall_number,
            rows_count: hall.rows_count,
            seats_per_row: hall.seats_per_row,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ScreeningDetailResponse {
    pub id: i32,
    pub date: String,
    pub date_raw: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub movie: MovieResponse,
    pub hall: HallResponse,
    pub tariff: TariffResponse,
}

impl From<ScreeningDetail> for ScreeningDetailResponse {
    fn from(detail: ScreeningDetail) -> Self {
        Self {
            id: detail.id,
            date: format_date(detail.session_date),
            date_raw: detail.session_date,
            start_time: format_time(detail.start_time),
            end_time: format_time(detail.end_time),
            movie: detail.movie.into(),
            hall: detail.hall.into(),
            tariff: detail.tariff.into(),
        }
    }
}

/// A seat as shown on the hall map.
#[derive(Serialize, ToSchema)]
pub struct SeatResponse {
    pub id: i32,
    pub row: i32,
    pub seat: i32,
    #[serde(rename = "type")]
    pub seat_type: String,
}

impl From<Seat> for SeatResponse {
    fn from(seat: Seat) -> Self {
        Self {
            id: seat.id,
            row: seat.row_number,
            seat: seat.seat_number,
            seat_type: seat.seat_type,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SoldTicketResponse {
    pub id: i32,
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub payment_method: String,
    pub seat_id: i32,
    pub row_number: i32,
    pub seat_number: i32,
    pub seat_type: String,
}

impl From<SoldTicket> for SoldTicketResponse {
    fn from(ticket: SoldTicket) -> Self {
        Self {
            id: ticket.id,
            customer_name: ticket.customer_name,
            price: ticket.price,
            payment_method: ticket.payment_method,
            seat_id: ticket.seat_id,
            row_number: ticket.row_number,
            seat_number: ticket.seat_number,
            seat_type: ticket.seat_type,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub full_name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            full_name: user.full_name,
        }
    }
}

/// The response payload sent after a row was inserted.
#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: i32,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_version: String,
    pub movie_count: i64,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List all movies ordered by id.
#[utoipa::path(
    get,
    path = "/api/movies",
    responses(
        (status = 200, description = "All movies", body = [MovieResponse]),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn list_movies_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movies = state
        .db
        .list_movies()
        .await
        .map_err(|e| port_error_response(e, "list movies"))?;

    info!("API /api/movies: returned {} movies", movies.len());
    let body: Vec<MovieResponse> = movies.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// List the schedule: every screening with its movie, hall and tariff.
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Screenings ordered by date and start time", body = [ScheduleEntryResponse]),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = state
        .db
        .list_screenings()
        .await
        .map_err(|e| port_error_response(e, "list sessions"))?;

    info!("API /api/sessions: returned {} sessions", entries.len());
    let body: Vec<ScheduleEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = i32, Path, description = "Screening id")),
    responses(
        (status = 200, description = "The screening", body = ScreeningDetailResponse),
        (status = 404, description = "No such screening")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let detail = state
        .db
        .get_screening(session_id)
        .await
        .map_err(|e| port_error_response(e, "load session"))?;
    Ok(Json(ScreeningDetailResponse::from(detail)))
}

/// Tickets sold for a screening and not returned.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/tickets",
    params(("id" = i32, Path, description = "Screening id")),
    responses(
        (status = 200, description = "Sold tickets", body = [SoldTicketResponse])
    )
)]
pub async fn sold_tickets_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tickets = state
        .db
        .sold_tickets(session_id)
        .await
        .map_err(|e| port_error_response(e, "list sold tickets"))?;
    let body: Vec<SoldTicketResponse> = tickets.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/tariffs",
    responses((status = 200, description = "All tariffs", body = [TariffResponse]))
)]
pub async fn list_tariffs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tariffs = state
        .db
        .list_tariffs()
        .await
        .map_err(|e| port_error_response(e, "list tariffs"))?;
    let body: Vec<TariffResponse> = tariffs.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/halls",
    responses((status = 200, description = "All halls", body = [HallResponse]))
)]
pub async fn list_halls_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let halls = state
        .db
        .list_halls()
        .await
        .map_err(|e| port_error_response(e, "list halls"))?;
    let body: Vec<HallResponse> = halls.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Seats of a hall ordered by row, then seat number.
#[utoipa::path(
    get,
    path = "/api/halls/{id}/seats",
    params(("id" = i32, Path, description = "Hall id")),
    responses((status = 200, description = "Seats of the hall", body = [SeatResponse]))
)]
pub async fn list_seats_handler(
    State(state): State<Arc<AppState>>,
    Path(hall_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let seats = state
        .db
        .list_seats(hall_id)
        .await
        .map_err(|e| port_error_response(e, "list seats"))?;
    let body: Vec<SeatResponse> = seats.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let info = state
        .db
        .server_info()
        .await
        .map_err(|e| port_error_response(e, "check database"))?;
    Ok(Json(HealthResponse {
        status: "ok",
        database_version: info.version,
        movie_count: info.movie_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_rows_use_local_date_format() {
        let entry = ScheduleEntry {
            id: 3,
            session_date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 30).unwrap(),
            movie: "Stalker".to_string(),
            hall: 2,
            tariff_name: "Morning".to_string(),
            price: Decimal::new(25050, 2),
        };
        let json = serde_json::to_value(ScheduleEntryResponse::from(entry)).unwrap();
        assert_eq!(json["date"], "08.03.2024");
        assert_eq!(json["date_raw"], "2024-03-08");
        assert_eq!(json["start_time"], "09:05");
        assert_eq!(json["end_time"], "11:00");
        assert_eq!(json["price"].as_f64(), Some(250.5));
    }

    #[test]
    fn seats_use_short_keys() {
        let seat = Seat {
            id: 11,
            hall_id: 1,
            row_number: 4,
            seat_number: 9,
            seat_type: "vip".to_string(),
        };
        let json = serde_json::to_value(SeatResponse::from(seat)).unwrap();
        assert_eq!(json, serde_json::json!({"id": 11, "row": 4, "seat": 9, "type": "vip"}));
    }
}
