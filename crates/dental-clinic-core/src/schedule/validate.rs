//! Appointment form validation.
//!
//! Runs before any database call. Produces a form whose date and times
//! are canonical.

use super::{normalize_date_str, normalize_time, ScheduleError, ScheduleResult, TimeBlock};
use crate::models::{Appointment, AppointmentPatch, NewAppointment};

fn require(value: &str, field: &'static str) -> ScheduleResult<()> {
    if value.trim().is_empty() {
        return Err(ScheduleError::MissingField(field));
    }
    Ok(())
}

fn normalize_form(form: &NewAppointment) -> ScheduleResult<NewAppointment> {
    require(&form.patient_id, "patientId")?;
    require(&form.doctor_id, "doctorId")?;
    require(&form.date, "date")?;
    require(&form.start_time, "startTime")?;
    require(&form.end_time, "endTime")?;

    let date = normalize_date_str(&form.date)?;
    let start_time = normalize_time(&form.start_time)?;
    let end_time = normalize_time(&form.end_time)?;
    TimeBlock::parse(&start_time, &end_time)?;

    Ok(NewAppointment {
        patient_id: form.patient_id.trim().to_string(),
        doctor_id: form.doctor_id.trim().to_string(),
        date,
        start_time,
        end_time,
        notes: non_blank(&form.notes),
        treatment_type: non_blank(&form.treatment_type),
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a new appointment; the date may not be before `today`.
pub fn validate_new_appointment(form: &NewAppointment, today: &str) -> ScheduleResult<NewAppointment> {
    let form = normalize_form(form)?;
    if form.date.as_str() < today {
        return Err(ScheduleError::PastDate {
            date: form.date,
            today: today.to_string(),
        });
    }
    Ok(form)
}

/// Validate a full edit of an existing appointment; past dates are allowed.
pub fn validate_appointment_edit(form: &NewAppointment) -> ScheduleResult<NewAppointment> {
    normalize_form(form)
}

/// Normalize the temporal fields a patch carries.
pub fn normalize_patch(patch: &AppointmentPatch) -> ScheduleResult<AppointmentPatch> {
    let mut normalized = patch.clone();
    if let Some(doctor_id) = &patch.doctor_id {
        require(doctor_id, "doctorId")?;
    }
    if let Some(date) = &patch.date {
        normalized.date = Some(normalize_date_str(date)?);
    }
    if let Some(start) = &patch.start_time {
        normalized.start_time = Some(normalize_time(start)?);
    }
    if let Some(end) = &patch.end_time {
        normalized.end_time = Some(normalize_time(end)?);
    }
    Ok(normalized)
}

/// Check that a stored appointment has a canonical date and a valid block.
pub fn validate_appointment(appointment: &Appointment) -> ScheduleResult<()> {
    require(&appointment.patient_id, "patientId")?;
    require(&appointment.doctor_id, "doctorId")?;
    if normalize_date_str(&appointment.date)? != appointment.date {
        return Err(ScheduleError::InvalidDate(appointment.date.clone()));
    }
    TimeBlock::parse(&appointment.start_time, &appointment.end_time)?;
    Ok(())
}
