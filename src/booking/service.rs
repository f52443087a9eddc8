use std::sync::Arc;

use uuid::Uuid;

use crate::booking::candidates::CandidateFinder;
use crate::booking::load_balancer::LoadBalancer;
use crate::booking::metrics::{BookingMetrics, MetricsSummary};
use crate::booking::occupancy::OccupancyFilter;
use crate::booking::{
    Appointment, AppointmentFilter, AppointmentStatus, Assignment, AvailabilityPreview,
    BookingError, BookingOutcome, BookingStore, BookingTransaction, BookingUnit, CandidateLoad,
    CreateAppointmentRequest, SlotKey, StatusMachine,
};

/// Service for appointment booking business logic
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    metrics: BookingMetrics,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            metrics: BookingMetrics::new(),
        }
    }

    /// Book an appointment, assigning a practitioner automatically unless
    /// one is named in the request.
    ///
    /// # Errors
    /// - `ValidationError` for missing or malformed fields (storage untouched)
    /// - `BranchNotFound` / `PractitionerNotFound` for unknown references
    /// - `NoAvailablePractitioner` when nobody qualifies and is free
    /// - `ConcurrentBookingLost` when the chosen practitioner was taken
    ///   between selection and commit
    /// - `StorageError` for anything the database reports
    pub async fn book(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<BookingOutcome, BookingError> {
        let _timer = self.metrics.start_booking();

        let mut transaction = BookingTransaction::new(self.store.as_ref());
        let result = transaction.execute(request).await;

        match &result {
            Ok(outcome) => self
                .metrics
                .record_committed(matches!(outcome.assignment, Assignment::Auto { .. })),
            Err(e) => self.metrics.record_failure(e),
        }
        result
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.store
            .find_appointment(id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// Appointments matching the filter, ordered by date then time slot
    pub async fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, BookingError> {
        self.store.list_appointments(&filter).await
    }

    /// Administrative status change. Never touches the assigned practitioner.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        let current = self.get_appointment(id).await?;

        StatusMachine::transition(current.status, new_status)
            .map_err(BookingError::InvalidTransition)?;

        if current.status == new_status {
            return Ok(current);
        }

        match self.store.update_status(id, current.status, new_status).await? {
            Some(updated) => {
                tracing::info!(
                    "Appointment {} status {} → {}",
                    id,
                    current.status,
                    updated.status
                );
                Ok(updated)
            }
            None => {
                // Someone else moved it first
                let latest = self.get_appointment(id).await?;
                Err(BookingError::InvalidTransition(format!(
                    "Appointment status changed to {} during update",
                    latest.status
                )))
            }
        }
    }

    /// Dry run of automatic assignment for a slot. Reads only; the unit of
    /// work is always rolled back.
    pub async fn preview_availability(
        &self,
        slot: SlotKey,
    ) -> Result<AvailabilityPreview, BookingError> {
        let mut unit = self.store.begin().await?;
        let result = Self::preview_in(unit.as_mut(), &slot).await;
        if let Err(e) = unit.rollback().await {
            tracing::warn!("Rollback after availability preview failed: {}", e);
        }
        let (candidates, suggested_practitioner_id) = result?;

        Ok(AvailabilityPreview {
            branch_id: slot.branch_id,
            date: slot.date,
            weekday: slot.weekday(),
            time: slot.time,
            candidates,
            suggested_practitioner_id,
        })
    }

    async fn preview_in(
        unit: &mut dyn BookingUnit,
        slot: &SlotKey,
    ) -> Result<(Vec<CandidateLoad>, Option<Uuid>), BookingError> {
        if !unit.branch_exists(slot.branch_id).await? {
            return Err(BookingError::BranchNotFound(slot.branch_id));
        }

        let qualified =
            CandidateFinder::qualified(unit, slot.branch_id, slot.weekday(), &slot.time).await?;
        let free = OccupancyFilter::apply(unit, qualified, slot).await?;
        if free.is_empty() {
            return Ok((Vec::new(), None));
        }

        let ids: Vec<Uuid> = free.iter().map(|p| p.id).collect();
        let loads = unit.active_loads(&ids, slot.branch_id, slot.date).await?;
        let suggested = LoadBalancer::pick(free.clone(), &loads)
            .ok()
            .map(|selection| selection.practitioner.id);

        let candidates = free
            .into_iter()
            .map(|practitioner| CandidateLoad {
                active_appointments: loads.get(&practitioner.id).copied().unwrap_or(0),
                practitioner,
            })
            .collect();

        Ok((candidates, suggested))
    }

    /// Check storage connectivity
    pub async fn health(&self) -> Result<(), BookingError> {
        self.store.ping().await
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    pub fn log_metrics(&self) {
        self.metrics.log_summary();
    }
}
