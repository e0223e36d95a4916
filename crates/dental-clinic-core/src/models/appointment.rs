//! Appointment models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Appointment status.
///
/// The set is flat: any status may move to any other through an explicit
/// user action (see [`crate::schedule::transition`]).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Every status, in display order.
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    /// Whether the appointment still occupies its time block.
    pub fn blocks_schedule(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no-show" => Ok(AppointmentStatus::NoShow),
            other => Err(ValidationError::invalid(
                "status",
                format!("unknown appointment status '{}'", other),
            )),
        }
    }
}

/// A scheduled appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// Canonical `YYYY-MM-DD` calendar date
    pub date: String,
    /// `HH:MM`, 24-hour
    pub start_time: String,
    /// `HH:MM`, 24-hour
    pub end_time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Free-form tag such as "Limpieza" or "Ortodoncia"
    pub treatment_type: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Build an appointment from a validated form.
    ///
    /// The form's date and times must already be canonical; use
    /// [`crate::schedule::validate_new_appointment`] first.
    pub fn from_form(form: &NewAppointment) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: form.patient_id.clone(),
            doctor_id: form.doctor_id.clone(),
            date: form.date.clone(),
            start_time: form.start_time.clone(),
            end_time: form.end_time.clone(),
            status: AppointmentStatus::Scheduled,
            notes: form.notes.clone(),
            treatment_type: form.treatment_type.clone(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply a partial update in place. Returns true if any field changed.
    pub fn apply_patch(&mut self, patch: &AppointmentPatch) -> bool {
        let before = self.clone();
        if let Some(doctor_id) = &patch.doctor_id {
            self.doctor_id = doctor_id.clone();
        }
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(start_time) = &patch.start_time {
            self.start_time = start_time.clone();
        }
        if let Some(end_time) = &patch.end_time {
            self.end_time = end_time.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(treatment_type) = &patch.treatment_type {
            self.treatment_type = treatment_type.clone();
        }
        let changed = *self != before;
        if changed {
            self.touch();
        }
        changed
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Form state for creating or fully editing an appointment.
///
/// Dates and times may arrive in any accepted input format; validation
/// normalizes them to canonical strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
    pub treatment_type: Option<String>,
}

/// Partial update: only the fields that are `Some` are transmitted.
///
/// `notes` and `treatment_type` are doubly optional so a patch can clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<Option<String>>,
    pub treatment_type: Option<Option<String>>,
}

impl AppointmentPatch {
    /// A patch that only changes the status.
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Whether the patch touches the date or time block.
    pub fn reschedules(&self) -> bool {
        self.doctor_id.is_some()
            || self.date.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Appointment joined with patient and doctor display names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub doctor_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_form() -> NewAppointment {
        NewAppointment {
            patient_id: "patient-1".into(),
            doctor_id: "doctor-1".into(),
            date: "2025-01-10".into(),
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            notes: None,
            treatment_type: Some("Limpieza".into()),
        }
    }

    #[test]
    fn test_from_form_defaults_to_scheduled() {
        let appointment = Appointment::from_form(&make_form());
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.date, "2025-01-10");
        assert_eq!(appointment.id.len(), 36);
    }

    #[test]
    fn test_status_wire_strings() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
            "\"no-show\""
        );
        assert!("noshow".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_status_patch_leaves_other_fields() {
        let mut appointment = Appointment::from_form(&make_form());
        let before = appointment.clone();

        assert!(appointment.apply_patch(&AppointmentPatch::status(AppointmentStatus::Confirmed)));
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.date, before.date);
        assert_eq!(appointment.start_time, before.start_time);
        assert_eq!(appointment.treatment_type, before.treatment_type);
    }

    #[test]
    fn test_patch_can_clear_notes() {
        let mut form = make_form();
        form.notes = Some("Traer radiografía".into());
        let mut appointment = Appointment::from_form(&form);

        let patch = AppointmentPatch {
            notes: Some(None),
            ..Default::default()
        };
        assert!(appointment.apply_patch(&patch));
        assert_eq!(appointment.notes, None);
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut appointment = Appointment::from_form(&make_form());
        let patch = AppointmentPatch::default();
        assert!(patch.is_empty());
        assert!(!appointment.apply_patch(&patch));
    }
}
