//! Appointment status state machine.
//!
//! The machine is flat: every status may move to every other one. There is
//! no enforced workflow order; a receptionist can mark a cancelled visit as
//! completed if that is what happened.

use crate::models::{Appointment, AppointmentPatch, AppointmentStatus};

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

impl StatusChange {
    /// Partial update carrying only the new status.
    pub fn patch(&self) -> AppointmentPatch {
        AppointmentPatch::status(self.to)
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Plan a transition. Always succeeds.
pub fn transition(appointment: &Appointment, target: AppointmentStatus) -> StatusChange {
    StatusChange {
        from: appointment.status,
        to: target,
    }
}

/// Statuses offered as actions from `current`.
pub fn available_actions(current: AppointmentStatus) -> Vec<AppointmentStatus> {
    AppointmentStatus::ALL
        .into_iter()
        .filter(|status| *status != current)
        .collect()
}
