//! crates/cinema_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The web layer only ever talks to the database through `DatabaseService`,
//! which keeps handlers testable against an in-memory implementation.

use async_trait::async_trait;

use crate::domain::{
    AuthSession, DatabaseInfo, Hall, Movie, NewMovie, NewScreening, NewTariff, NewTicket,
    NewUser, ScheduleEntry, ScreeningDetail, Seat, SoldTicket, Tariff, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the database driver).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Conflicting data: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// One method per entity operation. Each call runs a single statement and
/// commits on its own; deletes report whether a row matched.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Movies ---
    async fn list_movies(&self) -> PortResult<Vec<Movie>>;

    async fn add_movie(&self, movie: NewMovie) -> PortResult<i32>;

    async fn delete_movie(&self, movie_id: i32) -> PortResult<bool>;

    // --- Screenings ---
    /// All screenings ordered by date, then start time.
    async fn list_screenings(&self) -> PortResult<Vec<ScheduleEntry>>;

    async fn get_screening(&self, screening_id: i32) -> PortResult<ScreeningDetail>;

    async fn add_screening(&self, screening: NewScreening) -> PortResult<i32>;

    async fn delete_screening(&self, screening_id: i32) -> PortResult<bool>;

    // --- Tariffs ---
    async fn list_tariffs(&self) -> PortResult<Vec<Tariff>>;

    async fn add_tariff(&self, tariff: NewTariff) -> PortResult<i32>;

    async fn delete_tariff(&self, tariff_id: i32) -> PortResult<bool>;

    // --- Halls and Seats ---
    async fn list_halls(&self) -> PortResult<Vec<Hall>>;

    /// Seats of one hall ordered by row, then seat number.
    async fn list_seats(&self, hall_id: i32) -> PortResult<Vec<Seat>>;

    // --- Tickets ---
    /// Tickets of a screening that have not been returned.
    async fn sold_tickets(&self, screening_id: i32) -> PortResult<Vec<SoldTicket>>;

    async fn buy_ticket(&self, ticket: NewTicket) -> PortResult<i32>;

    /// Marks the ticket returned; the row is kept.
    async fn return_ticket(&self, ticket_id: i32) -> PortResult<bool>;

    // --- Users ---
    async fn list_users(&self) -> PortResult<Vec<User>>;

    /// Returns the user only when both username and password match.
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<Option<User>>;

    async fn add_user(&self, user: NewUser) -> PortResult<i32>;

    async fn delete_user(&self, user_id: i32) -> PortResult<bool>;

    // --- Auth Sessions ---
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()>;

    /// Resolves a live (unexpired) token to its user, or `Unauthorized`.
    async fn validate_auth_session(&self, token: &str) -> PortResult<User>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    async fn purge_expired_auth_sessions(&self) -> PortResult<u64>;

    // --- Diagnostics ---
    async fn server_info(&self) -> PortResult<DatabaseInfo>;
}
