use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::booking::error::BookingError;
use crate::models::{DayOfWeek, Practitioner, TimeSlot};
use crate::validation::{
    parse_calendar_date, validate_calendar_date, validate_initial_status, validate_not_blank,
    validate_time_slot,
};

/// Appointment status enum representing the lifecycle of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "rescheduled" => Ok(AppointmentStatus::Rescheduled),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }

    /// Whether the appointment still claims its slot
    pub fn is_active(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }

    /// Whether a new booking may start in this status
    pub fn can_open_booking(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::Rescheduled
        )
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Scheduled
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing an appointment in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub branch_id: Uuid,
    /// Assigned practitioner; always set for appointments created by booking
    pub practitioner_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[sqlx(rename = "appointment_date")]
    #[schema(value_type = String, format = Date, example = "2024-06-10")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00")]
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    #[schema(example = "Annual eye exam")]
    pub reason: String,
    pub lens_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The (branch, date, time) a booking targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub branch_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeSlot,
}

impl SlotKey {
    pub fn weekday(&self) -> DayOfWeek {
        DayOfWeek::of(self.date)
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "branch {} on {} at {}", self.branch_id, self.date, self.time)
    }
}

/// Request DTO for booking an appointment
///
/// Required fields are optional at the type level so that a missing field is
/// reported as a validation error instead of a body deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentRequest {
    #[serde(default, alias = "branchId")]
    #[validate(required)]
    pub branch_id: Option<Uuid>,

    /// Calendar date, "YYYY-MM-DD" (an RFC 3339 timestamp is accepted, its date is kept)
    #[serde(default)]
    #[validate(required, custom = "validate_calendar_date")]
    #[schema(example = "2024-06-10")]
    pub date: Option<String>,

    /// 24h "HH:MM"
    #[serde(default)]
    #[validate(required, custom = "validate_time_slot")]
    #[schema(example = "09:00")]
    pub time: Option<String>,

    /// Initial status: scheduled, confirmed or rescheduled
    #[serde(default)]
    #[validate(required, custom = "validate_initial_status")]
    #[schema(example = "scheduled")]
    pub status: Option<String>,

    #[serde(default)]
    #[validate(required, custom = "validate_not_blank")]
    #[schema(example = "Annual eye exam")]
    pub reason: Option<String>,

    /// Omitted for walk-ins
    #[serde(default, alias = "clientId")]
    pub client_id: Option<Uuid>,

    /// When present, automatic assignment is skipped
    #[serde(default, alias = "practitionerId")]
    pub practitioner_id: Option<Uuid>,

    #[serde(default, alias = "lensType")]
    pub lens_type: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateAppointmentRequest {
    /// Validate the request and convert it into a typed booking request.
    /// Performs no I/O.
    pub fn into_booking(self) -> Result<BookingRequest, BookingError> {
        self.validate()
            .map_err(|e| BookingError::ValidationError(e.to_string()))?;

        let branch_id = self.branch_id.ok_or_else(|| missing("branch_id"))?;
        let date = self
            .date
            .as_deref()
            .and_then(parse_calendar_date)
            .ok_or_else(|| missing("date"))?;
        let time = TimeSlot::parse(self.time.as_deref().ok_or_else(|| missing("time"))?)
            .map_err(BookingError::ValidationError)?;
        let status = AppointmentStatus::from_str(self.status.as_deref().ok_or_else(|| missing("status"))?)
            .map_err(BookingError::ValidationError)?;
        let reason = self
            .reason
            .map(|r| r.trim().to_string())
            .ok_or_else(|| missing("reason"))?;

        Ok(BookingRequest {
            slot: SlotKey { branch_id, date, time },
            status,
            reason,
            client_id: self.client_id,
            practitioner_id: self.practitioner_id,
            lens_type: non_empty(self.lens_type),
            notes: non_empty(self.notes),
        })
    }
}

fn missing(field: &str) -> BookingError {
    BookingError::ValidationError(format!("{} is required", field))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A validated booking request
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub slot: SlotKey,
    pub status: AppointmentStatus,
    pub reason: String,
    pub client_id: Option<Uuid>,
    pub practitioner_id: Option<Uuid>,
    pub lens_type: Option<String>,
    pub notes: Option<String>,
}

/// Row to insert once a practitioner has been resolved
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub practitioner_id: Uuid,
    pub client_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub reason: String,
    pub lens_type: Option<String>,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn from_request(request: &BookingRequest, practitioner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            branch_id: request.slot.branch_id,
            practitioner_id,
            client_id: request.client_id,
            date: request.slot.date,
            time_slot: request.slot.time.clone(),
            status: request.status,
            reason: request.reason.clone(),
            lens_type: request.lens_type.clone(),
            notes: request.notes.clone(),
        }
    }
}

/// Filter for listing appointments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub branch_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub practitioner_id: Option<Uuid>,
    pub include_cancelled: bool,
}

/// Query parameters for GET /api/appointments
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    pub branch_id: Option<Uuid>,
    /// Calendar date, "YYYY-MM-DD"
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    pub practitioner_id: Option<Uuid>,
    /// Include cancelled appointments (default false)
    #[serde(default)]
    pub include_cancelled: bool,
}

impl From<AppointmentListQuery> for AppointmentFilter {
    fn from(query: AppointmentListQuery) -> Self {
        Self {
            branch_id: query.branch_id,
            date: query.date,
            practitioner_id: query.practitioner_id,
            include_cancelled: query.include_cancelled,
        }
    }
}

/// Query parameters for GET /api/availability
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub branch_id: Uuid,
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// 24h "HH:MM"
    #[param(value_type = String)]
    pub time: TimeSlot,
}

impl From<AvailabilityQuery> for SlotKey {
    fn from(query: AvailabilityQuery) -> Self {
        Self {
            branch_id: query.branch_id,
            date: query.date,
            time: query.time,
        }
    }
}

/// Request DTO for updating appointment status
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// A qualified, unoccupied practitioner and their active load for the day
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CandidateLoad {
    pub practitioner: Practitioner,
    pub active_appointments: i64,
}

/// Response DTO for the availability preview
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityPreview {
    pub branch_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub time: TimeSlot,
    pub weekday: DayOfWeek,
    /// Candidates in discovery order
    pub candidates: Vec<CandidateLoad>,
    /// Practitioner automatic assignment would pick right now, if any
    pub suggested_practitioner_id: Option<Uuid>,
}
