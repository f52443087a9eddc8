// Booking Transaction
//
// Select → reverify → commit inside one unit of work:
//
//   Requested → AutoAssigning → Selected ─┐
//            └→ ExplicitPractitioner ─────┴→ Reverifying → Committed | Conflict
//
// Every failure rolls the unit back, so an error always means no appointment
// was written.

use uuid::Uuid;

use crate::booking::candidates::CandidateFinder;
use crate::booking::load_balancer::LoadBalancer;
use crate::booking::occupancy::OccupancyFilter;
use crate::booking::{
    Appointment, BookingError, BookingRequest, BookingStore, BookingUnit,
    CreateAppointmentRequest, NewAppointment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Requested,
    AutoAssigning,
    ExplicitPractitioner,
    Selected,
    Reverifying,
    Committed,
    Conflict,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Requested => "requested",
            BookingState::AutoAssigning => "auto_assigning",
            BookingState::ExplicitPractitioner => "explicit_practitioner",
            BookingState::Selected => "selected",
            BookingState::Reverifying => "reverifying",
            BookingState::Committed => "committed",
            BookingState::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the practitioner was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Picked by the load balancer with this many active appointments that day
    Auto { active_appointments: i64 },
    Explicit,
}

#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub assignment: Assignment,
}

pub struct BookingTransaction<'a> {
    store: &'a dyn BookingStore,
    state: BookingState,
}

impl<'a> BookingTransaction<'a> {
    pub fn new(store: &'a dyn BookingStore) -> Self {
        Self {
            store,
            state: BookingState::Requested,
        }
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    fn advance(&mut self, next: BookingState) {
        tracing::debug!("Booking {} → {}", self.state, next);
        self.state = next;
    }

    /// Run the whole booking. Validation happens before storage is touched.
    pub async fn execute(
        &mut self,
        request: CreateAppointmentRequest,
    ) -> Result<BookingOutcome, BookingError> {
        let booking = request.into_booking()?;

        let mut unit = self.store.begin().await?;
        match self.run(unit.as_mut(), &booking).await {
            Ok(outcome) => {
                unit.commit().await?;
                self.advance(BookingState::Committed);
                tracing::info!(
                    "Booked appointment {} with practitioner {:?} at {}",
                    outcome.appointment.id,
                    outcome.appointment.practitioner_id,
                    booking.slot
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = unit.rollback().await {
                    tracing::warn!("Rollback after failed booking also failed: {}", rollback_err);
                }
                if e.is_conflict() {
                    self.advance(BookingState::Conflict);
                    tracing::warn!("Booking conflict at {}: {}", booking.slot, e);
                }
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        unit: &mut dyn BookingUnit,
        booking: &BookingRequest,
    ) -> Result<BookingOutcome, BookingError> {
        let slot = &booking.slot;

        if !unit.branch_exists(slot.branch_id).await? {
            return Err(BookingError::BranchNotFound(slot.branch_id));
        }

        let (practitioner_id, assignment) = match booking.practitioner_id {
            Some(id) => {
                self.advance(BookingState::ExplicitPractitioner);
                Self::resolve_explicit(unit, id).await?
            }
            None => {
                self.advance(BookingState::AutoAssigning);
                let candidates =
                    CandidateFinder::qualified(unit, slot.branch_id, slot.weekday(), &slot.time)
                        .await?;
                let free = OccupancyFilter::apply(unit, candidates, slot).await?;
                let selection = LoadBalancer::select(unit, free, slot.branch_id, slot.date).await?;
                self.advance(BookingState::Selected);
                (
                    selection.practitioner.id,
                    Assignment::Auto {
                        active_appointments: selection.active_appointments,
                    },
                )
            }
        };

        self.advance(BookingState::Reverifying);
        if !OccupancyFilter::is_free(unit, practitioner_id, slot).await? {
            return Err(BookingError::ConcurrentBookingLost(practitioner_id));
        }

        let appointment = unit
            .insert_appointment(&NewAppointment::from_request(booking, practitioner_id))
            .await?;

        Ok(BookingOutcome {
            appointment,
            assignment,
        })
    }

    async fn resolve_explicit(
        unit: &mut dyn BookingUnit,
        id: Uuid,
    ) -> Result<(Uuid, Assignment), BookingError> {
        match unit.find_practitioner(id).await? {
            Some(practitioner) => Ok((practitioner.id, Assignment::Explicit)),
            None => Err(BookingError::PractitionerNotFound(id)),
        }
    }
}
