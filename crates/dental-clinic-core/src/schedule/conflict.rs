//! Double-booking detection.
//!
//! Two appointments conflict when they share a doctor and a date, neither
//! is cancelled, and their `[start, end)` blocks overlap.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ScheduleError, ScheduleResult, TimeBlock};
use crate::models::Appointment;

/// What to do when a new or edited appointment overlaps another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Refuse the write
    #[default]
    Reject,
    /// Write anyway, log and report the overlaps
    Warn,
    /// Skip the check
    Allow,
}

fn block_of(appointment: &Appointment) -> ScheduleResult<TimeBlock> {
    TimeBlock::parse(&appointment.start_time, &appointment.end_time)
}

/// Existing appointments that overlap `candidate`.
pub fn find_conflicts<'a>(
    candidate: &Appointment,
    existing: &'a [Appointment],
) -> ScheduleResult<Vec<&'a Appointment>> {
    if !candidate.status.blocks_schedule() {
        return Ok(Vec::new());
    }
    let block = block_of(candidate)?;

    let mut conflicts = Vec::new();
    for other in existing {
        if other.id == candidate.id
            || other.doctor_id != candidate.doctor_id
            || other.date != candidate.date
            || !other.status.blocks_schedule()
        {
            continue;
        }
        if block.overlaps(&block_of(other)?) {
            conflicts.push(other);
        }
    }
    Ok(conflicts)
}

/// Apply `policy` to the overlaps of `candidate`.
///
/// Returns the overlapping appointment ids that were tolerated (only
/// non-empty under [`ConflictPolicy::Warn`]).
pub fn check_conflicts(
    candidate: &Appointment,
    existing: &[Appointment],
    policy: ConflictPolicy,
) -> ScheduleResult<Vec<String>> {
    if policy == ConflictPolicy::Allow {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = find_conflicts(candidate, existing)?
        .into_iter()
        .map(|a| a.id.clone())
        .collect();
    if ids.is_empty() {
        return Ok(ids);
    }

    match policy {
        ConflictPolicy::Reject => Err(ScheduleError::Conflict(ids)),
        _ => {
            warn!(
                doctor_id = %candidate.doctor_id,
                date = %candidate.date,
                start = %candidate.start_time,
                overlaps = ids.len(),
                "Appointment overlaps existing bookings"
            );
            Ok(ids)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, NewAppointment};

    fn make(doctor: &str, date: &str, start: &str, end: &str) -> Appointment {
        Appointment::from_form(&NewAppointment {
            patient_id: "p".into(),
            doctor_id: doctor.into(),
            date: date.into(),
            start_time: start.into(),
            end_time: end.into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_overlap_same_doctor_same_day() {
        let existing = vec![make("d1", "2025-01-10", "09:00", "10:00")];
        let candidate = make("d1", "2025-01-10", "09:30", "10:30");
        assert_eq!(find_conflicts(&candidate, &existing).unwrap().len(), 1);
    }

    #[test]
    fn test_adjacent_blocks_do_not_conflict() {
        let existing = vec![make("d1", "2025-01-10", "09:00", "10:00")];
        let candidate = make("d1", "2025-01-10", "10:00", "11:00");
        assert!(find_conflicts(&candidate, &existing).unwrap().is_empty());
    }

    #[test]
    fn test_other_doctor_other_day_or_cancelled_ignored() {
        let mut cancelled = make("d1", "2025-01-10", "09:00", "10:00");
        cancelled.status = AppointmentStatus::Cancelled;
        let existing = vec![
            make("d2", "2025-01-10", "09:00", "10:00"),
            make("d1", "2025-01-11", "09:00", "10:00"),
            cancelled,
        ];
        let candidate = make("d1", "2025-01-10", "09:00", "10:00");
        assert!(find_conflicts(&candidate, &existing).unwrap().is_empty());
    }

    #[test]
    fn test_editing_does_not_conflict_with_itself() {
        let original = make("d1", "2025-01-10", "09:00", "10:00");
        let mut edited = original.clone();
        edited.notes = Some("moved".into());
        assert!(find_conflicts(&edited, &[original]).unwrap().is_empty());
    }

    #[test]
    fn test_policies() {
        let existing = vec![make("d1", "2025-01-10", "09:00", "10:00")];
        let candidate = make("d1", "2025-01-10", "09:00", "10:00");

        assert!(matches!(
            check_conflicts(&candidate, &existing, ConflictPolicy::Reject),
            Err(ScheduleError::Conflict(ids)) if ids.len() == 1
        ));
        assert_eq!(
            check_conflicts(&candidate, &existing, ConflictPolicy::Warn).unwrap(),
            vec![existing[0].id.clone()]
        );
        assert!(check_conflicts(&candidate, &existing, ConflictPolicy::Allow)
            .unwrap()
            .is_empty());
    }
}
