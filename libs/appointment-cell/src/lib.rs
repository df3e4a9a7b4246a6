//! Appointment scheduling core of the clinic backend: working hours, overlap
//! detection, slot generation, day segmentation and validated booking.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use error::{BookingError, StoreError};
pub use router::appointment_routes;
pub use services::booking::AppointmentBookingService;
pub use services::hours::WorkingHours;
