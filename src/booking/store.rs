// Storage seams for the booking core.
//
// A booking runs every read and the final insert through one BookingUnit so
// that candidate discovery, reverification and commit share a single atomic
// unit of work.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::{
    Appointment, AppointmentFilter, AppointmentStatus, BookingError, NewAppointment, SlotKey,
};
use crate::models::{DayOfWeek, Practitioner};

/// Entry point to appointment storage
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a unit of work. Dropping the unit without committing rolls it back.
    async fn begin(&self) -> Result<Box<dyn BookingUnit>, BookingError>;

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, BookingError>;

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, BookingError>;

    /// Move an appointment from `expected` to `new_status`.
    /// Returns None when the appointment is missing or no longer in `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError>;

    /// Check that storage is reachable
    async fn ping(&self) -> Result<(), BookingError>;
}

/// One atomic unit of work against practitioners and appointments
#[async_trait]
pub trait BookingUnit: Send {
    async fn branch_exists(&mut self, branch_id: Uuid) -> Result<bool, BookingError>;

    async fn find_practitioner(&mut self, id: Uuid) -> Result<Option<Practitioner>, BookingError>;

    /// Coarse candidate query: generally available practitioners assigned to
    /// the branch with at least one window on the weekday, in discovery order.
    async fn practitioners_for(
        &mut self,
        branch_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<Practitioner>, BookingError>;

    /// Ids among `practitioner_ids` holding an active appointment at exactly `slot`
    async fn occupied_practitioners(
        &mut self,
        practitioner_ids: &[Uuid],
        slot: &SlotKey,
    ) -> Result<HashSet<Uuid>, BookingError>;

    /// Active appointment count per practitioner for the branch and date.
    /// Practitioners without appointments may be absent from the map.
    async fn active_loads(
        &mut self,
        practitioner_ids: &[Uuid],
        branch_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, i64>, BookingError>;

    async fn insert_appointment(
        &mut self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, BookingError>;

    async fn commit(self: Box<Self>) -> Result<(), BookingError>;

    async fn rollback(self: Box<Self>) -> Result<(), BookingError>;
}
