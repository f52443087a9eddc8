// Load Balancer
//
// Picks the candidate with the fewest active appointments for the branch and
// date. Ties go to the earliest candidate in discovery order.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::{BookingError, BookingUnit};
use crate::models::Practitioner;

/// Raised when there is nobody left to choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no candidate practitioner")]
pub struct NoCandidate;

impl From<NoCandidate> for BookingError {
    fn from(_: NoCandidate) -> Self {
        BookingError::NoAvailablePractitioner
    }
}

/// The chosen practitioner and their active load at selection time
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub practitioner: Practitioner,
    pub active_appointments: i64,
}

pub struct LoadBalancer;

impl LoadBalancer {
    /// Count loads with one batched aggregation and pick the least loaded
    pub async fn select(
        unit: &mut dyn BookingUnit,
        candidates: Vec<Practitioner>,
        branch_id: Uuid,
        date: NaiveDate,
    ) -> Result<Selection, BookingError> {
        if candidates.is_empty() {
            return Err(NoCandidate.into());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();
        let loads = unit.active_loads(&ids, branch_id, date).await?;
        Ok(Self::pick(candidates, &loads)?)
    }

    /// Minimum-load candidate; first in order wins a tie.
    /// Candidates missing from `loads` have no active appointments.
    pub fn pick(
        candidates: Vec<Practitioner>,
        loads: &HashMap<Uuid, i64>,
    ) -> Result<Selection, NoCandidate> {
        let mut best: Option<Selection> = None;

        for practitioner in candidates {
            let load = loads.get(&practitioner.id).copied().unwrap_or(0);
            let better = match &best {
                Some(current) => load < current.active_appointments,
                None => true,
            };
            if better {
                best = Some(Selection {
                    practitioner,
                    active_appointments: load,
                });
            }
        }

        best.ok_or(NoCandidate)
    }
}
