// Occupancy Filter
//
// Removes candidates who already hold an active appointment at the exact
// (branch, date, time). Occupancy is fetched with one batched query.

use std::collections::HashSet;

use uuid::Uuid;

use crate::booking::{BookingError, BookingUnit, SlotKey};
use crate::models::Practitioner;

pub struct OccupancyFilter;

impl OccupancyFilter {
    /// Keep the candidates that are free at `slot`, in their original order
    pub async fn apply(
        unit: &mut dyn BookingUnit,
        candidates: Vec<Practitioner>,
        slot: &SlotKey,
    ) -> Result<Vec<Practitioner>, BookingError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();
        let occupied = unit.occupied_practitioners(&ids, slot).await?;
        tracing::debug!("{} of {} candidate(s) already booked at {}", occupied.len(), ids.len(), slot);

        Ok(Self::retain_free(candidates, &occupied))
    }

    pub fn retain_free(candidates: Vec<Practitioner>, occupied: &HashSet<Uuid>) -> Vec<Practitioner> {
        candidates
            .into_iter()
            .filter(|p| !occupied.contains(&p.id))
            .collect()
    }

    /// Occupancy check for a single practitioner
    pub async fn is_free(
        unit: &mut dyn BookingUnit,
        practitioner_id: Uuid,
        slot: &SlotKey,
    ) -> Result<bool, BookingError> {
        let occupied = unit.occupied_practitioners(&[practitioner_id], slot).await?;
        Ok(!occupied.contains(&practitioner_id))
    }
}
