use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Business rejection of an order-lifecycle action. Each variant is one
/// distinguishable reason; the message carries the relevant boundary instant
/// so clients can render it verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderRejection {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date {0} is in the past")]
    PastDate(NaiveDate),

    #[error("{0}")]
    WindowExceeded(String),

    #[error("An active order already exists for {0}")]
    DuplicateOrder(NaiveDate),

    #[error("Ordering is closed on {date} ({name})")]
    HolidayBlocked { date: NaiveDate, name: String },

    #[error("Shift {0} not found")]
    ShiftNotFound(i64),

    #[error("Shift '{0}' is not active")]
    ShiftInactive(String),

    #[error("Ordering for {date} closed at {cutoff}")]
    CutoffPassed {
        date: NaiveDate,
        cutoff: DateTime<FixedOffset>,
    },

    #[error("Canteen capacity reached for {0}")]
    CapacityExceeded(NaiveDate),

    #[error("Ordering is suspended: {0}")]
    UserBlacklisted(String),

    #[error("Order cannot be cancelled in status '{0}'")]
    NotCancellable(String),

    #[error("Cancellation for {date} closed at {cutoff}")]
    CancelCutoffPassed {
        date: NaiveDate,
        cutoff: DateTime<FixedOffset>,
    },

    #[error("Check-in opens at {0}")]
    CheckinTooEarly(DateTime<FixedOffset>),

    #[error("Check-in closed at {0}")]
    CheckinTooLate(DateTime<FixedOffset>),

    #[error("Order has already been picked up")]
    AlreadyCheckedIn,

    #[error("Order has already been cancelled")]
    AlreadyCancelled,
}

impl OrderRejection {
    /// Stable error code used in API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            OrderRejection::InvalidDate(_) => "INVALID_DATE",
            OrderRejection::PastDate(_) => "PAST_DATE",
            OrderRejection::WindowExceeded(_) => "WINDOW_EXCEEDED",
            OrderRejection::DuplicateOrder(_) => "DUPLICATE_ORDER",
            OrderRejection::HolidayBlocked { .. } => "HOLIDAY_BLOCKED",
            OrderRejection::ShiftNotFound(_) => "SHIFT_NOT_FOUND",
            OrderRejection::ShiftInactive(_) => "SHIFT_INACTIVE",
            OrderRejection::CutoffPassed { .. } => "CUTOFF_PASSED",
            OrderRejection::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            OrderRejection::UserBlacklisted(_) => "USER_BLACKLISTED",
            OrderRejection::NotCancellable(_) => "NOT_CANCELLABLE",
            OrderRejection::CancelCutoffPassed { .. } => "CANCEL_CUTOFF_PASSED",
            OrderRejection::CheckinTooEarly(_) => "CHECKIN_TOO_EARLY",
            OrderRejection::CheckinTooLate(_) => "CHECKIN_TOO_LATE",
            OrderRejection::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            OrderRejection::AlreadyCancelled => "ALREADY_CANCELLED",
        }
    }

    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            OrderRejection::InvalidDate(_) | OrderRejection::PastDate(_) => StatusCode::BAD_REQUEST,
            OrderRejection::ShiftNotFound(_) => StatusCode::NOT_FOUND,
            OrderRejection::UserBlacklisted(_) => StatusCode::FORBIDDEN,
            OrderRejection::DuplicateOrder(_)
            | OrderRejection::NotCancellable(_)
            | OrderRejection::AlreadyCheckedIn
            | OrderRejection::AlreadyCancelled => StatusCode::CONFLICT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Too many attempts: {0}")]
    RateLimited(String),

    #[error("{0}")]
    OrderRejected(#[from] OrderRejection),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    "Forbidden".to_string(),
                )
            }
            AppError::RateLimited(msg) => {
                log::warn!("Rate limited: {msg}");
                (
                    actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    msg.clone(),
                )
            }
            AppError::OrderRejected(rejection) => {
                log::warn!("Order rejected [{}]: {rejection}", rejection.code());
                (
                    rejection.status_code(),
                    rejection.code(),
                    rejection.to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_are_distinct() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let instant = DateTime::parse_from_rfc3339("2025-01-10T02:00:00+08:00").unwrap();
        let all = vec![
            OrderRejection::InvalidDate("x".into()),
            OrderRejection::PastDate(date),
            OrderRejection::WindowExceeded("w".into()),
            OrderRejection::DuplicateOrder(date),
            OrderRejection::HolidayBlocked {
                date,
                name: "h".into(),
            },
            OrderRejection::ShiftNotFound(1),
            OrderRejection::ShiftInactive("s".into()),
            OrderRejection::CutoffPassed {
                date,
                cutoff: instant,
            },
            OrderRejection::CapacityExceeded(date),
            OrderRejection::UserBlacklisted("b".into()),
            OrderRejection::NotCancellable("picked_up".into()),
            OrderRejection::CancelCutoffPassed {
                date,
                cutoff: instant,
            },
            OrderRejection::CheckinTooEarly(instant),
            OrderRejection::CheckinTooLate(instant),
            OrderRejection::AlreadyCheckedIn,
            OrderRejection::AlreadyCancelled,
        ];
        let mut codes: Vec<&str> = all.iter().map(|r| r.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn cutoff_message_carries_boundary_instant() {
        let rejection = OrderRejection::CutoffPassed {
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            cutoff: DateTime::parse_from_rfc3339("2025-01-10T02:00:00+08:00").unwrap(),
        };
        let msg = rejection.to_string();
        assert!(msg.contains("2025-01-10"));
        assert!(msg.contains("02:00"));
    }
}
