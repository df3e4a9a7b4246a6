// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{BookingDraft, DateQuery, NewAppointmentType, TypeListQuery, TypeStatusRequest};
use crate::services::booking::AppointmentBookingService;

pub type SchedulingState = Arc<AppointmentBookingService>;

// ==============================================================================
// DAY VIEWS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_slots(
    State(service): State<SchedulingState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = service.get_slots(query.date).await?;

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_segments(
    State(service): State<SchedulingState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let segments = service.get_segments(query.date).await?;

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "segments": segments
    })))
}

#[axum::debug_handler]
pub async fn get_day_appointments(
    State(service): State<SchedulingState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.get_day(query.date).await?;

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn check_day_consistency(
    State(service): State<SchedulingState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let report = service.check_day_consistency(query.date).await?;

    Ok(Json(json!({
        "success": true,
        "consistency": report
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<SchedulingState>,
    Json(mut draft): Json<BookingDraft>,
) -> Result<Json<Value>, AppError> {
    // Creation never edits; the id in the path is the only way to do that.
    draft.appointment_id = None;
    let appointment = service.submit_booking(draft).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Json(mut draft): Json<BookingDraft>,
) -> Result<Json<Value>, AppError> {
    draft.appointment_id = Some(appointment_id);
    let appointment = service.submit_booking(draft).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    service.delete_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

// ==============================================================================
// APPOINTMENT TYPE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointment_types(
    State(service): State<SchedulingState>,
    Query(query): Query<TypeListQuery>,
) -> Result<Json<Value>, AppError> {
    let types = service.types().list_types(query.active.unwrap_or(false)).await?;

    Ok(Json(json!({
        "success": true,
        "appointment_types": types
    })))
}

#[axum::debug_handler]
pub async fn create_appointment_type(
    State(service): State<SchedulingState>,
    Json(request): Json<NewAppointmentType>,
) -> Result<Json<Value>, AppError> {
    let created = service.types().create_type(request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment_type": created
    })))
}

#[axum::debug_handler]
pub async fn set_appointment_type_status(
    State(service): State<SchedulingState>,
    Path(type_id): Path<Uuid>,
    Json(request): Json<TypeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = service.types().set_type_status(type_id, request.status).await?;

    Ok(Json(json!({
        "success": true,
        "appointment_type": updated
    })))
}
