// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub fn appointment_routes(service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        // Day views
        .route("/slots", get(handlers::get_slots))
        .route("/segments", get(handlers::get_segments))
        .route("/day", get(handlers::get_day_appointments))
        .route("/consistency", get(handlers::check_day_consistency))

        // Appointment types
        .route(
            "/types",
            get(handlers::list_appointment_types).post(handlers::create_appointment_type),
        )
        .route("/types/{type_id}/status", patch(handlers::set_appointment_type_status))

        // Booking
        .route("/", post(handlers::book_appointment))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(service)
}
