//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every port call is one parameterized statement run in autocommit mode. Text
//! columns of every returned row pass through the configured `TextRepair`.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use cinema_core::domain::{
    AuthSession, DatabaseInfo, Hall, Movie, NewMovie, NewScreening, NewTariff, NewTicket,
    NewUser, ScheduleEntry, ScreeningDetail, Seat, SoldTicket, Tariff, User,
};
use cinema_core::ports::{DatabaseService, PortError, PortResult};
use cinema_core::TextRepair;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::adapters::password::{hash_password, reject_unknown_user, verify_password};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    repair: TextRepair,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, repair: TextRepair) -> Self {
        Self { pool, repair }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Opens the connection pool. Closed connections are replaced on next use.
pub async fn create_pool(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Classifies driver failures so the web layer can tell "no such row" from
/// "database down" from "constraint rejected the write".
fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(e.to_string()),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            PortError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // unique_violation, foreign_key_violation
            Some("23505") | Some("23503") => PortError::Conflict(db_err.message().to_string()),
            // check_violation
            Some("23514") => PortError::InvalidInput(db_err.message().to_string()),
            _ => PortError::Unexpected(e.to_string()),
        },
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct MovieRecord {
    id: i32,
    title: String,
    duration: i32,
    genre: Option<String>,
    age_rating: Option<String>,
}
impl MovieRecord {
    fn to_domain(self, repair: TextRepair) -> Movie {
        Movie {
            id: self.id,
            title: repair.apply(self.title),
            duration: self.duration,
            genre: repair.apply_opt(self.genre),
            age_rating: repair.apply_opt(self.age_rating),
        }
    }
}

#[derive(FromRow)]
struct ScheduleRecord {
    id: i32,
    session_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    movie: String,
    hall: i32,
    tariff_name: String,
    price: Decimal,
}
impl ScheduleRecord {
    fn to_domain(self, repair: TextRepair) -> ScheduleEntry {
        ScheduleEntry {
            id: self.id,
            session_date: self.session_date,
            start_time: self.start_time,
            end_time: self.end_time,
            movie: repair.apply(self.movie),
            hall: self.hall,
            tariff_name: repair.apply(self.tariff_name),
            price: self.price,
        }
    }
}

#[derive(FromRow)]
struct ScreeningDetailRecord {
    id: i32,
    session_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    movie_id: i32,
    title: String,
    duration: i32,
    genre: Option<String>,
    age_rating: Option<String>,
    hall_id: i32,
    hall_number: i32,
    rows_count: i32,
    seats_per_row: i32,
    tariff_id: i32,
    tariff_name: String,
    price: Decimal,
}
impl ScreeningDetailRecord {
    fn to_domain(self, repair: TextRepair) -> ScreeningDetail {
        ScreeningDetail {
            id: self.id,
            session_date: self.session_date,
            start_time: self.start_time,
            end_time: self.end_time,
            movie: Movie {
                id: self.movie_id,
                title: repair.apply(self.title),
                duration: self.duration,
                genre: repair.apply_opt(self.genre),
                age_rating: repair.apply_opt(self.age_rating),
            },
            hall: Hall {
                id: self.hall_id,
                hall_number: self.hall_number,
                rows_count: self.rows_count,
                seats_per_row: self.seats_per_row,
            },
            tariff: Tariff {
                id: self.tariff_id,
                name: repair.apply(self.tariff_name),
                price: self.price,
            },
        }
    }
}

#[derive(FromRow)]
struct TariffRecord {
    id: i32,
    name: String,
    price: Decimal,
}
impl TariffRecord {
    fn to_domain(self, repair: TextRepair) -> Tariff {
        Tariff {
            id: self.id,
            name: repair.apply(self.name),
            price: self.price,
        }
    }
}

#[derive(FromRow)]
struct HallRecord {
    id: i32,
    hall_number: i32,
    rows_count: i32,
    seats_per_row: i32,
}
impl HallRecord {
    fn to_domain(self) -> Hall {
        Hall {
            id: self.id,
            hall_number: self.hall_number,
            rows_count: self.rows_count,
            seats_per_row: self.seats_per_row,
        }
    }
}

#[derive(FromRow)]
struct SeatRecord {
    id: i32,
    hall_id: i32,
    row_number: i32,
    seat_number: i32,
    seat_type: String,
}
impl SeatRecord {
    fn to_domain(self, repair: TextRepair) -> Seat {
        Seat {
            id: self.id,
            hall_id: self.hall_id,
            row_number: self.row_number,
            seat_number: self.seat_number,
            seat_type: repair.apply(self.seat_type),
        }
    }
}

#[derive(FromRow)]
struct SoldTicketRecord {
    id: i32,
    customer_name: String,
    price: Decimal,
    payment_method: String,
    seat_id: i32,
    row_number: i32,
    seat_number: i32,
    seat_type: String,
}
impl SoldTicketRecord {
    fn to_domain(self, repair: TextRepair) -> SoldTicket {
        SoldTicket {
            id: self.id,
            customer_name: repair.apply(self.customer_name),
            price: self.price,
            payment_method: repair.apply(self.payment_method),
            seat_id: self.seat_id,
            row_number: self.row_number,
            seat_number: self.seat_number,
            seat_type: repair.apply(self.seat_type),
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i32,
    username: String,
    role: String,
    full_name: Option<String>,
}
impl UserRecord {
    fn to_domain(self, repair: TextRepair) -> User {
        User {
            id: self.id,
            username: repair.apply(self.username),
            role: repair.apply(self.role),
            full_name: repair.apply_opt(self.full_name),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i32,
    username: String,
    password: String,
    role: String,
    full_name: Option<String>,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_movies(&self) -> PortResult<Vec<Movie>> {
        let records = sqlx::query_as::<_, MovieRecord>(
            "SELECT id, title, duration, genre, age_rating FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Fetched {} movies", records.len());
        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn add_movie(&self, movie: NewMovie) -> PortResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO movies (title, duration, genre, age_rating) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(movie.title)
        .bind(movie.duration)
        .bind(movie.genre)
        .bind(movie.age_rating)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_movie(&self, movie_id: i32) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_screenings(&self) -> PortResult<Vec<ScheduleEntry>> {
        let records = sqlx::query_as::<_, ScheduleRecord>(
            r#"
            SELECT
                s.id,
                s.session_date,
                s.start_time,
                s.end_time,
                m.title AS movie,
                h.hall_number AS hall,
                t.tariff_name,
                t.price
            FROM sessions s
            JOIN movies m ON s.movie_id = m.id
            JOIN halls h ON s.hall_id = h.id
            JOIN tariffs t ON s.tariff_id = t.id
            ORDER BY s.session_date, s.start_time
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Fetched {} screenings", records.len());
        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn get_screening(&self, screening_id: i32) -> PortResult<ScreeningDetail> {
        let record = sqlx::query_as::<_, ScreeningDetailRecord>(
            r#"
            SELECT
                s.id,
                s.session_date,
                s.start_time,
                s.end_time,
                m.id AS movie_id,
                m.title,
                m.duration,
                m.genre,
                m.age_rating,
                h.id AS hall_id,
                h.hall_number,
                h.rows_count,
                h.seats_per_row,
                t.id AS tariff_id,
                t.tariff_name,
                t.price
            FROM sessions s
            JOIN movies m ON s.movie_id = m.id
            JOIN halls h ON s.hall_id = h.id
            JOIN tariffs t ON s.tariff_id = t.id
            WHERE s.id = $1
            "#,
        )
        .bind(screening_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| PortError::NotFound(format!("Screening {} not found", screening_id)))?;

        Ok(record.to_domain(self.repair))
    }

    async fn add_screening(&self, screening: NewScreening) -> PortResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO sessions (movie_id, hall_id, session_date, start_time, end_time, tariff_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(screening.movie_id)
        .bind(screening.hall_id)
        .bind(screening.session_date)
        .bind(screening.start_time)
        .bind(screening.end_time)
        .bind(screening.tariff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_screening(&self, screening_id: i32) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(screening_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tariffs(&self) -> PortResult<Vec<Tariff>> {
        let records = sqlx::query_as::<_, TariffRecord>(
            "SELECT id, tariff_name AS name, price FROM tariffs ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn add_tariff(&self, tariff: NewTariff) -> PortResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO tariffs (tariff_name, price) VALUES ($1, $2) RETURNING id",
        )
        .bind(tariff.name)
        .bind(tariff.price)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_tariff(&self, tariff_id: i32) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM tariffs WHERE id = $1")
            .bind(tariff_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_halls(&self) -> PortResult<Vec<Hall>> {
        let records = sqlx::query_as::<_, HallRecord>(
            "SELECT id, hall_number, rows_count, seats_per_row FROM halls ORDER BY hall_number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(HallRecord::to_domain).collect())
    }

    async fn list_seats(&self, hall_id: i32) -> PortResult<Vec<Seat>> {
        let records = sqlx::query_as::<_, SeatRecord>(
            r#"
            SELECT id, hall_id, row_number, seat_number, seat_type
            FROM seats
            WHERE hall_id = $1
            ORDER BY row_number, seat_number
            "#,
        )
        .bind(hall_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Fetched {} seats for hall {}", records.len(), hall_id);
        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn sold_tickets(&self, screening_id: i32) -> PortResult<Vec<SoldTicket>> {
        let records = sqlx::query_as::<_, SoldTicketRecord>(
            r#"
            SELECT
                t.id,
                t.customer_name,
                t.price,
                t.payment_method,
                s.id AS seat_id,
                s.row_number,
                s.seat_number,
                s.seat_type
            FROM tickets t
            JOIN seats s ON t.seat_id = s.id
            WHERE t.session_id = $1 AND t.is_returned = false
            ORDER BY s.row_number, s.seat_number
            "#,
        )
        .bind(screening_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Fetched {} sold tickets for screening {}", records.len(), screening_id);
        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn buy_ticket(&self, ticket: NewTicket) -> PortResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO tickets (session_id, seat_id, customer_name, price, payment_method, is_returned)
            VALUES ($1, $2, $3, $4, $5, false)
            RETURNING id
            "#,
        )
        .bind(ticket.session_id)
        .bind(ticket.seat_id)
        .bind(ticket.customer_name)
        .bind(ticket.price)
        .bind(ticket.payment_method)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn return_ticket(&self, ticket_id: i32) -> PortResult<bool> {
        let result = sqlx::query("UPDATE tickets SET is_returned = true WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, role, full_name FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(|r| r.to_domain(self.repair)).collect())
    }

    async fn authenticate(&self, username: &str, password: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, password, role, full_name FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(record) = record else {
            reject_unknown_user(password);
            return Ok(None);
        };
        if !verify_password(password, &record.password) {
            return Ok(None);
        }

        let user = UserRecord {
            id: record.id,
            username: record.username,
            role: record.role,
            full_name: record.full_name,
        };
        Ok(Some(user.to_domain(self.repair)))
    }

    async fn add_user(&self, user: NewUser) -> PortResult<i32> {
        let password_hash = hash_password(&user.password)?;
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, password, role, full_name) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user.username)
        .bind(password_hash)
        .bind(user.role)
        .bind(user.full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_user(&self, user_id: i32) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.username, u.role, u.full_name
            FROM auth_sessions a
            JOIN users u ON u.id = a.user_id
            WHERE a.token = $1 AND a.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(PortError::Unauthorized)?;

        Ok(record.to_domain(self.repair))
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn purge_expired_auth_sessions(&self) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn server_info(&self) -> PortResult<DatabaseInfo> {
        let version = sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let movie_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(DatabaseInfo { version, movie_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_failures_are_unavailable() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            map_sqlx_error(sqlx::Error::Io(refused)),
            PortError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            PortError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            PortError::Unavailable(_)
        ));
    }

    #[test]
    fn missing_row_is_not_found() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            PortError::NotFound(_)
        ));
    }

    #[test]
    fn other_failures_are_unexpected() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::Protocol("bad frame".to_string())),
            PortError::Unexpected(_)
        ));
    }

    #[test]
    fn records_are_repaired_field_by_field() {
        let garbled: String = "Ёлки".bytes().map(char::from).collect();
        let record = MovieRecord {
            id: 7,
            title: garbled.clone(),
            duration: 95,
            genre: Some(garbled),
            age_rating: None,
        };
        let movie = record.to_domain(TextRepair::Latin1);
        assert_eq!(movie.title, "Ёлки");
        assert_eq!(movie.genre.as_deref(), Some("Ёлки"));
        assert_eq!(movie.age_rating, None);
        assert_eq!(movie.duration, 95);
    }
}
