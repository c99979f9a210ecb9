//! crates/cinema_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::ports::PortError;

//=========================================================================================
// Catalog
//=========================================================================================

/// A film that can be scheduled for screenings.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    /// Running time in minutes.
    pub duration: i32,
    pub genre: Option<String>,
    pub age_rating: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub duration: i32,
    pub genre: Option<String>,
    pub age_rating: Option<String>,
}

impl NewMovie {
    pub fn validate(&self) -> Result<(), PortError> {
        require_text("title", &self.title)?;
        if self.duration <= 0 {
            return Err(PortError::InvalidInput(
                "duration must be a positive number of minutes".to_string(),
            ));
        }
        Ok(())
    }
}

/// An auditorium. Halls are provisioned out of band and only read here.
#[derive(Debug, Clone, PartialEq)]
pub struct Hall {
    pub id: i32,
    pub hall_number: i32,
    pub rows_count: i32,
    pub seats_per_row: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub id: i32,
    pub hall_id: i32,
    pub row_number: i32,
    pub seat_number: i32,
    pub seat_type: String,
}

/// A named price level applied to screenings.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewTariff {
    pub name: String,
    pub price: Decimal,
}

impl NewTariff {
    pub fn validate(&self) -> Result<(), PortError> {
        require_text("name", &self.name)?;
        require_non_negative("price", self.price)
    }
}

//=========================================================================================
// Screenings
//=========================================================================================

/// One row of the public schedule: a screening joined with its movie, hall and tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: i32,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub movie: String,
    pub hall: i32,
    pub tariff_name: String,
    pub price: Decimal,
}

/// A single screening with the full records it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningDetail {
    pub id: i32,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub movie: Movie,
    pub hall: Hall,
    pub tariff: Tariff,
}

#[derive(Debug, Clone)]
pub struct NewScreening {
    pub movie_id: i32,
    pub hall_id: i32,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub tariff_id: i32,
}

impl NewScreening {
    // Screenings may run past midnight, so only an empty slot is rejected.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.start_time == self.end_time {
            return Err(PortError::InvalidInput(
                "end_time must differ from start_time".to_string(),
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Tickets
//=========================================================================================

/// A ticket that has been sold and not returned, joined with its seat.
#[derive(Debug, Clone, PartialEq)]
pub struct SoldTicket {
    pub id: i32,
    pub customer_name: String,
    pub price: Decimal,
    pub payment_method: String,
    pub seat_id: i32,
    pub row_number: i32,
    pub seat_number: i32,
    pub seat_type: String,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub session_id: i32,
    pub seat_id: i32,
    pub customer_name: String,
    pub price: Decimal,
    pub payment_method: String,
}

impl NewTicket {
    pub fn validate(&self) -> Result<(), PortError> {
        require_text("customer_name", &self.customer_name)?;
        require_text("payment_method", &self.payment_method)?;
        require_non_negative("price", self.price)
    }
}

//=========================================================================================
// Users and login sessions
//=========================================================================================

// Represents a staff user - never carries the password
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub full_name: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

pub const ADMIN_ROLE: &str = "admin";

// Only used when creating an account - contains the clear password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), PortError> {
        require_text("username", &self.username)?;
        require_text("password", &self.password)?;
        require_text("role", &self.role)
    }
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

/// What the database reports about itself; used by the health check.
#[derive(Debug, Clone)]
pub struct DatabaseInfo {
    pub version: String,
    pub movie_count: i64,
}

fn require_text(field: &str, value: &str) -> Result<(), PortError> {
    if value.trim().is_empty() {
        return Err(PortError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> Result<(), PortError> {
    if value.is_sign_negative() {
        return Err(PortError::InvalidInput(format!("{} must not be negative", field)));
    }
    Ok(())
}
