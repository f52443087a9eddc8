// HTTP handlers for appointment endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::booking::metrics::MetricsSummary;
use crate::booking::{
    Appointment, AppointmentListQuery, AvailabilityPreview, AvailabilityQuery, BookingError,
    CreateAppointmentRequest, UpdateAppointmentStatusRequest,
};
use crate::error::ErrorResponse;

/// Handler for POST /api/appointments
/// Books an appointment; a practitioner is assigned automatically when none is given
#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Missing or malformed field", body = ErrorResponse),
        (status = 404, description = "Branch or practitioner not found", body = ErrorResponse),
        (status = 409, description = "No practitioner available for that date, time and branch", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn create_appointment_handler(
    State(state): State<crate::AppState>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), BookingError> {
    let Json(request) = payload?;
    let outcome = state.booking_service.book(request).await?;

    Ok((StatusCode::CREATED, Json(outcome.appointment)))
}

/// Handler for GET /api/appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Appointments ordered by date and time slot", body = Vec<Appointment>),
        (status = 400, description = "Malformed query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn list_appointments_handler(
    State(state): State<crate::AppState>,
    query: Result<Query<AppointmentListQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, BookingError> {
    let Query(query) = query?;
    let appointments = state
        .booking_service
        .list_appointments(query.into())
        .await?;

    Ok(Json(appointments))
}

/// Handler for GET /api/appointments/{id}
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    responses(
        (status = 200, description = "Appointment found", body = Appointment),
        (status = 400, description = "Malformed appointment ID", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn get_appointment_handler(
    State(state): State<crate::AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Appointment>, BookingError> {
    let Path(id) = id?;
    let appointment = state.booking_service.get_appointment(id).await?;

    Ok(Json(appointment))
}

/// Handler for PATCH /api/appointments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    request_body = UpdateAppointmentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Appointment),
        (status = 400, description = "Malformed request or transition not allowed", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn update_appointment_status_handler(
    State(state): State<crate::AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAppointmentStatusRequest>, JsonRejection>,
) -> Result<Json<Appointment>, BookingError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let appointment = state
        .booking_service
        .update_status(id, request.status)
        .await?;

    Ok(Json(appointment))
}

/// Handler for GET /api/availability
/// Shows who automatic assignment could pick for a slot, without booking
#[utoipa::path(
    get,
    path = "/api/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Free, qualified practitioners and their load", body = AvailabilityPreview),
        (status = 400, description = "Malformed query", body = ErrorResponse),
        (status = 404, description = "Branch not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn availability_handler(
    State(state): State<crate::AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityPreview>, BookingError> {
    let Query(query) = query?;
    let preview = state
        .booking_service
        .preview_availability(query.into())
        .await?;

    Ok(Json(preview))
}

/// Handler for GET /api/metrics/booking
#[utoipa::path(
    get,
    path = "/api/metrics/booking",
    responses(
        (status = 200, description = "Booking counters and timings", body = MetricsSummary)
    ),
    tag = "metrics"
)]
pub async fn booking_metrics_handler(State(state): State<crate::AppState>) -> Json<MetricsSummary> {
    Json(state.booking_service.metrics())
}
