use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

/// Time of day in 24h "HH:MM" form, always zero-padded to five characters.
///
/// Because every value is normalized, the derived lexical ordering is the
/// chronological ordering for times on the same day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(String);

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})$").expect("time slot pattern is valid")
    })
}

impl TimeSlot {
    /// Parse and normalize a time string ("9:00" becomes "09:00")
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let captures = time_pattern()
            .captures(trimmed)
            .ok_or_else(|| format!("Invalid time format '{}': expected HH:MM", raw))?;

        let hour: u32 = captures[1]
            .parse()
            .map_err(|_| format!("Invalid hour in time '{}'", raw))?;
        let minute: u32 = captures[2]
            .parse()
            .map_err(|_| format!("Invalid minute in time '{}'", raw))?;

        if hour >= 24 {
            return Err(format!("Hour must be 0-23 in time '{}'", raw));
        }
        if minute >= 60 {
            return Err(format!("Minute must be 0-59 in time '{}'", raw));
        }

        Ok(TimeSlot(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.0
    }
}

impl sqlx::Type<Postgres> for TimeSlot {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

// Stored values go through the same normalization as request input
impl<'r> sqlx::Decode<'r, Postgres> for TimeSlot {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <String as sqlx::Decode<Postgres>>::decode(value)?;
        Ok(TimeSlot::parse(&raw)?)
    }
}

impl<'q> sqlx::Encode<'q, Postgres> for TimeSlot {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <&str as sqlx::Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Day of the week an availability window applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    /// Weekday a calendar date falls on
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekly window during which a practitioner can be booked: [start_time, end_time)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityWindow {
    pub weekday: DayOfWeek,
    #[schema(value_type = String, example = "08:00")]
    pub start_time: TimeSlot,
    #[schema(value_type = String, example = "12:00")]
    pub end_time: TimeSlot,
}

/// An optometrist who can be assigned to appointments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Practitioner {
    pub id: Uuid,
    /// Employee record this practitioner belongs to
    pub staff_member_id: Uuid,
    #[schema(example = "Contact lenses")]
    pub specialty: String,
    #[schema(example = "OPT-20931")]
    pub license_number: String,
    #[schema(example = 7)]
    pub years_experience: i32,
    pub availability_windows: Vec<AvailabilityWindow>,
    pub assigned_branch_ids: Vec<Uuid>,
    pub is_generally_available: bool,
}

/// A physical store location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Branch {
    pub id: Uuid,
    #[schema(example = "Downtown")]
    pub name: String,
    #[schema(example = "12 Main Street")]
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}
