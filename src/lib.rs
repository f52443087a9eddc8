pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::State,
    http::Uri,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use booking::{BookingService, BookingStore};
use error::{ApiError, ErrorResponse};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        booking::create_appointment_handler,
        booking::list_appointments_handler,
        booking::get_appointment_handler,
        booking::update_appointment_status_handler,
        booking::availability_handler,
        booking::booking_metrics_handler,
        health_check,
    ),
    components(
        schemas(
            booking::Appointment,
            booking::AppointmentStatus,
            booking::CreateAppointmentRequest,
            booking::UpdateAppointmentStatusRequest,
            booking::AvailabilityPreview,
            booking::CandidateLoad,
            booking::metrics::MetricsSummary,
            models::Practitioner,
            models::AvailabilityWindow,
            models::DayOfWeek,
            ErrorResponse,
        )
    ),
    tags(
        (name = "appointments", description = "Appointment booking with automatic practitioner assignment"),
        (name = "metrics", description = "Booking counters and timings"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Optica Booking API",
        version = "0.1.0",
        description = "Books eye-exam appointments and assigns the least-loaded available optometrist"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub booking_service: BookingService,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            booking_service: BookingService::new(store),
        }
    }
}

/// Handler for GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Storage reachable"),
        (status = 503, description = "Storage unreachable", body = ErrorResponse)
    ),
    tag = "health"
)]
async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .booking_service
        .health()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(json!({ "status": "ok" })))
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "Route".to_string(),
        id: uri.path().to_string(),
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds tracing and CORS middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .route(
            "/api/appointments",
            post(booking::create_appointment_handler).get(booking::list_appointments_handler),
        )
        .route("/api/appointments/:id", get(booking::get_appointment_handler))
        .route(
            "/api/appointments/:id/status",
            patch(booking::update_appointment_status_handler),
        )
        .route("/api/availability", get(booking::availability_handler))
        .route("/api/metrics/booking", get(booking::booking_metrics_handler))
        .fallback(route_not_found)
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}

#[cfg(test)]
mod tests;
