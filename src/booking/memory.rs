// In-memory booking store.
//
// A unit of work holds the state lock for its whole lifetime, so bookings are
// serialized. Inserts are staged and only become visible on commit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::booking::{
    Appointment, AppointmentFilter, AppointmentStatus, BookingError, BookingStore, BookingUnit,
    NewAppointment, SlotKey,
};
use crate::models::{Branch, DayOfWeek, Practitioner};

#[derive(Debug, Default)]
struct MemoryState {
    branches: HashMap<Uuid, Branch>,
    /// Insertion order is discovery order
    practitioners: Vec<Practitioner>,
    appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_branch(&self, branch: Branch) {
        self.state.lock().await.branches.insert(branch.id, branch);
    }

    pub async fn add_practitioner(&self, practitioner: Practitioner) {
        self.state.lock().await.practitioners.push(practitioner);
    }

    /// Seed an existing appointment, bypassing the booking protocol
    pub async fn add_appointment(&self, appointment: Appointment) {
        self.state.lock().await.appointments.push(appointment);
    }

    /// Snapshot of every stored appointment, cancelled included
    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.lock().await.appointments.clone()
    }
}

fn claims_slot(appointment: &Appointment, slot: &SlotKey) -> bool {
    appointment.status.is_active()
        && appointment.branch_id == slot.branch_id
        && appointment.date == slot.date
        && appointment.time_slot == slot.time
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingUnit>, BookingError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryUnit {
            guard,
            staged: Vec::new(),
        }))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, BookingError> {
        let state = self.state.lock().await;
        Ok(state.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, BookingError> {
        let state = self.state.lock().await;
        let mut found: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|a| filter.include_cancelled || a.status.is_active())
            .filter(|a| filter.branch_id.map_or(true, |id| a.branch_id == id))
            .filter(|a| filter.date.map_or(true, |date| a.date == date))
            .filter(|a| {
                filter
                    .practitioner_id
                    .map_or(true, |id| a.practitioner_id == Some(id))
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            (a.date, &a.time_slot, a.created_at).cmp(&(b.date, &b.time_slot, b.created_at))
        });
        Ok(found)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError> {
        let mut state = self.state.lock().await;
        match state
            .appointments
            .iter_mut()
            .find(|a| a.id == id && a.status == expected)
        {
            Some(appointment) => {
                appointment.status = new_status;
                appointment.updated_at = Utc::now();
                Ok(Some(appointment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), BookingError> {
        Ok(())
    }
}

struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Vec<Appointment>,
}

impl MemoryUnit {
    fn visible(&self) -> impl Iterator<Item = &Appointment> {
        self.guard.appointments.iter().chain(self.staged.iter())
    }
}

#[async_trait]
impl BookingUnit for MemoryUnit {
    async fn branch_exists(&mut self, branch_id: Uuid) -> Result<bool, BookingError> {
        Ok(self.guard.branches.contains_key(&branch_id))
    }

    async fn find_practitioner(&mut self, id: Uuid) -> Result<Option<Practitioner>, BookingError> {
        Ok(self.guard.practitioners.iter().find(|p| p.id == id).cloned())
    }

    async fn practitioners_for(
        &mut self,
        branch_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<Practitioner>, BookingError> {
        Ok(self
            .guard
            .practitioners
            .iter()
            .filter(|p| p.is_generally_available && p.assigned_branch_ids.contains(&branch_id))
            .filter(|p| p.availability_windows.iter().any(|w| w.weekday == weekday))
            .cloned()
            .collect())
    }

    async fn occupied_practitioners(
        &mut self,
        practitioner_ids: &[Uuid],
        slot: &SlotKey,
    ) -> Result<HashSet<Uuid>, BookingError> {
        Ok(self
            .visible()
            .filter(|a| claims_slot(a, slot))
            .filter_map(|a| a.practitioner_id)
            .filter(|id| practitioner_ids.contains(id))
            .collect())
    }

    async fn active_loads(
        &mut self,
        practitioner_ids: &[Uuid],
        branch_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, i64>, BookingError> {
        let mut loads = HashMap::new();
        for appointment in self.visible() {
            if !appointment.status.is_active()
                || appointment.branch_id != branch_id
                || appointment.date != date
            {
                continue;
            }
            if let Some(id) = appointment.practitioner_id.filter(|id| practitioner_ids.contains(id)) {
                *loads.entry(id).or_insert(0) += 1;
            }
        }
        Ok(loads)
    }

    async fn insert_appointment(
        &mut self,
        new: &NewAppointment,
    ) -> Result<Appointment, BookingError> {
        let slot = SlotKey {
            branch_id: new.branch_id,
            date: new.date,
            time: new.time_slot.clone(),
        };
        let taken = self
            .visible()
            .any(|a| claims_slot(a, &slot) && a.practitioner_id == Some(new.practitioner_id));
        if taken && new.status.is_active() {
            return Err(BookingError::ConcurrentBookingLost(new.practitioner_id));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: new.id,
            branch_id: new.branch_id,
            practitioner_id: Some(new.practitioner_id),
            client_id: new.client_id,
            date: new.date,
            time_slot: new.time_slot.clone(),
            status: new.status,
            reason: new.reason.clone(),
            lens_type: new.lens_type.clone(),
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.staged.push(appointment.clone());
        Ok(appointment)
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        let MemoryUnit { mut guard, staged } = *self;
        guard.appointments.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        Ok(())
    }
}
