use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::AppointmentStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Appointment {start}-{end} falls outside working hours {day_start}-{day_end}")]
    WorkingHours {
        start: String,
        end: String,
        day_start: String,
        day_end: String,
    },

    #[error("Appointment conflicts with {} existing booking(s)", conflicting.len())]
    Conflict { conflicting: Vec<Uuid> },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Appointment type still has {count} future booking(s)")]
    HasFutureBookings { count: u64 },

    #[error("Not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::Validation(message.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("malformed record: {}", err))
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => BookingError::NotFound(id),
            other => BookingError::Persistence(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            e @ BookingError::WorkingHours { .. } => AppError::BadRequest(e.to_string()),
            e @ BookingError::Conflict { .. } => AppError::Conflict(e.to_string()),
            e @ BookingError::HasFutureBookings { .. } => AppError::Conflict(e.to_string()),
            e @ BookingError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
            BookingError::NotFound(id) => AppError::NotFound(format!("Record {} not found", id)),
            BookingError::Persistence(msg) => AppError::Database(msg),
        }
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
