// Validation utilities module
// Custom validator functions for booking request fields

use chrono::{DateTime, NaiveDate};
use validator::ValidationError;

use crate::booking::AppointmentStatus;
use crate::models::TimeSlot;

/// Parse a calendar date given as "YYYY-MM-DD" or as an RFC 3339 timestamp.
/// Only the calendar day of a timestamp is kept.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
}

/// Validates that a time slot is a 24h "HH:MM" time
pub fn validate_time_slot(time: &str) -> Result<(), ValidationError> {
    match TimeSlot::parse(time) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("invalid_time_slot")),
    }
}

/// Validates that a date is a calendar date
pub fn validate_calendar_date(date: &str) -> Result<(), ValidationError> {
    match parse_calendar_date(date) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("invalid_date")),
    }
}

/// Validates that free text is not empty or whitespace only
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Validates that a status can open a booking.
/// Completed and cancelled appointments cannot be booked directly.
pub fn validate_initial_status(status: &str) -> Result<(), ValidationError> {
    match AppointmentStatus::from_str(status) {
        Ok(s) if s.can_open_booking() => Ok(()),
        Ok(_) => Err(ValidationError::new("status_not_bookable")),
        Err(_) => Err(ValidationError::new("invalid_status")),
    }
}
