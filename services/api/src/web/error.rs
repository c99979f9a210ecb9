//! services/api/src/web/error.rs
//!
//! Maps port failures to HTTP status codes. Listing endpoints do not hide
//! failures: an unreachable database is a 503, never an empty list.

use axum::http::StatusCode;
use cinema_core::ports::PortError;
use tracing::{error, warn};

pub fn port_error_status(e: &PortError) -> StatusCode {
    match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortError::Conflict(_) => StatusCode::CONFLICT,
        PortError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs the failure and turns it into the `(status, message)` pair returned by handlers.
///
/// `action` completes the sentence "Failed to ...".
pub fn port_error_response(e: PortError, action: &str) -> (StatusCode, String) {
    let status = port_error_status(&e);
    if status.is_server_error() {
        error!("Failed to {}: {:?}", action, e);
    } else {
        warn!("Failed to {}: {}", action, e);
    }

    let message = match e {
        PortError::Unavailable(_) => "Database is unavailable".to_string(),
        PortError::Unexpected(_) => format!("Failed to {}", action),
        PortError::Unauthorized => "Unauthorized".to_string(),
        PortError::NotFound(msg) | PortError::Conflict(msg) | PortError::InvalidInput(msg) => msg,
    };
    (status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_database_is_503() {
        let (status, message) =
            port_error_response(PortError::Unavailable("connection refused".into()), "list movies");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "Database is unavailable");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let (status, message) =
            port_error_response(PortError::Conflict("seat already sold".into()), "buy ticket");
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "seat already sold");

        let (status, _) = port_error_response(PortError::InvalidInput("x".into()), "add movie");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let (status, message) = port_error_response(
            PortError::Unexpected("syntax error at or near SELEC".into()),
            "list tariffs",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Failed to list tariffs");
    }
}
