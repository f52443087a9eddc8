// Availability Index
//
// Answers whether a practitioner can take a given weekday and time, and
// whether they serve a branch. Windows are half-open [start, end) and never
// span midnight.

use uuid::Uuid;

use crate::models::{AvailabilityWindow, DayOfWeek, Practitioner, TimeSlot};

pub struct AvailabilityIndex;

impl AvailabilityIndex {
    /// Whether a single window covers the weekday and time
    pub fn window_covers(window: &AvailabilityWindow, weekday: DayOfWeek, time: &TimeSlot) -> bool {
        window.weekday == weekday && window.start_time <= *time && *time < window.end_time
    }

    /// True iff the practitioner is generally available and one of their
    /// windows covers the weekday and time
    pub fn is_available(practitioner: &Practitioner, weekday: DayOfWeek, time: &TimeSlot) -> bool {
        practitioner.is_generally_available
            && practitioner
                .availability_windows
                .iter()
                .any(|window| Self::window_covers(window, weekday, time))
    }

    pub fn serves_branch(practitioner: &Practitioner, branch_id: Uuid) -> bool {
        practitioner.assigned_branch_ids.contains(&branch_id)
    }

    /// Branch assignment plus weekday/time availability
    pub fn is_bookable(
        practitioner: &Practitioner,
        branch_id: Uuid,
        weekday: DayOfWeek,
        time: &TimeSlot,
    ) -> bool {
        Self::serves_branch(practitioner, branch_id) && Self::is_available(practitioner, weekday, time)
    }
}
