use crate::booking::AppointmentStatus;

/// Lifecycle rules for appointment status changes
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Scheduled → Confirmed, Rescheduled, Cancelled
    /// - Confirmed → Completed, Rescheduled, Cancelled
    /// - Rescheduled → Scheduled, Confirmed, Cancelled
    /// - Completed, Cancelled → terminal
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
        if from == to {
            return true;
        }

        use AppointmentStatus::*;
        match (from, to) {
            (Scheduled, Confirmed) | (Scheduled, Rescheduled) | (Scheduled, Cancelled) => true,

            (Confirmed, Completed) | (Confirmed, Rescheduled) | (Confirmed, Cancelled) => true,

            (Rescheduled, Scheduled) | (Rescheduled, Confirmed) | (Rescheduled, Cancelled) => true,

            // Completed and Cancelled are terminal
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<AppointmentStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else if Self::is_terminal(from) {
            Err(format!("Appointment is {} and can no longer change status", from))
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }

    pub fn is_terminal(status: AppointmentStatus) -> bool {
        matches!(status, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}
