// Candidate Finder
//
// Bulk discovery of practitioners for a branch and weekday, refined by the
// availability index to the exact time of day.

use uuid::Uuid;

use crate::booking::availability::AvailabilityIndex;
use crate::booking::{BookingError, BookingUnit};
use crate::models::{DayOfWeek, Practitioner, TimeSlot};

pub struct CandidateFinder;

impl CandidateFinder {
    /// Coarse bulk query: branch assignment, weekday and general availability.
    /// Returns an empty list, never an error, when nobody matches.
    pub async fn discover(
        unit: &mut dyn BookingUnit,
        branch_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<Practitioner>, BookingError> {
        let found = unit.practitioners_for(branch_id, weekday).await?;
        tracing::debug!(
            "Discovered {} practitioner(s) for branch {} on {}",
            found.len(),
            branch_id,
            weekday
        );
        Ok(found)
    }

    /// Discovery followed by the full availability check, keeping discovery order
    pub async fn qualified(
        unit: &mut dyn BookingUnit,
        branch_id: Uuid,
        weekday: DayOfWeek,
        time: &TimeSlot,
    ) -> Result<Vec<Practitioner>, BookingError> {
        let discovered = Self::discover(unit, branch_id, weekday).await?;
        Ok(Self::refine(discovered, branch_id, weekday, time))
    }

    pub fn refine(
        discovered: Vec<Practitioner>,
        branch_id: Uuid,
        weekday: DayOfWeek,
        time: &TimeSlot,
    ) -> Vec<Practitioner> {
        discovered
            .into_iter()
            .filter(|p| AvailabilityIndex::is_bookable(p, branch_id, weekday, time))
            .collect()
    }
}
