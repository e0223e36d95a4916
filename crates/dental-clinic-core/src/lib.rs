//! Dental Clinic Core Library
//!
//! Scheduling, odontogram charting and record keeping for a dental clinic,
//! exposed to a UI shell through UniFFI.
//!
//! # Architecture
//!
//! ```text
//!   UI shell (forms, calendar, tooth chart)
//!                  │
//!          DentalClinicCore (FFI)
//!                  │
//!     ┌────────────┼──────────────┬──────────────┐
//!     ▼            ▼              ▼              ▼
//!  schedule    odontogram      access        refresh
//!  (dates,     (catalogs,     (admin list,  (invalidate,
//!   blocks,     tooth edits,   debug ctx)    stale drop)
//!   status,     suggestions)
//!   conflicts)
//!     │            │
//!     └─────┬──────┘
//!           ▼
//!     Database (SQLite)  ──►  reports, export
//! ```
//!
//! # Core Principle
//!
//! **Failures are surfaced, never papered over.** Every read returns a
//! `Result`; nothing falls back to sample data.
//!
//! # Modules
//!
//! - [`schedule`]: date normalization, time blocks, status transitions, conflicts
//! - [`odontogram`]: FDI catalogs, chart editing, treatment suggestions
//! - [`db`]: SQLite data access, one file per table
//! - [`models`]: Domain types (Patient, Appointment, Odontogram, etc.)
//! - [`reports`]: Dashboard and monthly aggregates
//! - [`export`]: Invoice export
//! - [`access`], [`config`], [`refresh`], [`revision`]: supporting concerns

pub mod access;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod odontogram;
pub mod refresh;
pub mod reports;
pub mod revision;
pub mod schedule;

// Re-export commonly used types
pub use access::{AccessPolicy, DebugContext};
pub use config::ClinicConfig;
pub use db::{Database, DbError};
pub use models::{
    Appointment, AppointmentPatch, AppointmentStatus, Doctor, InventoryItem, Invoice,
    InvoiceItem, InvoiceStatus, NewAppointment, Odontogram, Patient, ToothCondition,
    ToothStatus, Treatment, TreatmentStatus,
};
pub use odontogram::{Dentition, SuggestedTreatment, ToothChart, ToothEdit};
pub use refresh::{PollBackoff, QueryTracker};
pub use schedule::{ConflictPolicy, DayFilter, ScheduleError, TimeBlock, TimeOfDay};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use config::SchedulingConfig;
use refresh::keys;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Temporarily unavailable, retry: {0}")]
    Transient(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<rusqlite::Error> for ClinicError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    ClinicError::Transient(e.to_string())
                }
                rusqlite::ErrorCode::ConstraintViolation => ClinicError::Validation(e.to_string()),
                _ => ClinicError::Database(e.to_string()),
            },
            _ => ClinicError::Database(e.to_string()),
        }
    }
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Sqlite(e) => e.into(),
            db::DbError::Json(e) => e.into(),
            db::DbError::Schedule(e) => e.into(),
            e @ db::DbError::NotFound { .. } => ClinicError::NotFound(e.to_string()),
            e @ db::DbError::StaleRevision { .. } => ClinicError::Conflict(e.to_string()),
            e @ db::DbError::InUse { .. } => ClinicError::Conflict(e.to_string()),
            e @ db::DbError::Validation(_) => ClinicError::Validation(e.to_string()),
            e @ db::DbError::Constraint(_) => ClinicError::Database(e.to_string()),
        }
    }
}

impl From<schedule::ScheduleError> for ClinicError {
    fn from(e: schedule::ScheduleError) -> Self {
        match e {
            e @ schedule::ScheduleError::Conflict(_) => ClinicError::Conflict(e.to_string()),
            e => ClinicError::Validation(e.to_string()),
        }
    }
}

impl From<odontogram::OdontogramError> for ClinicError {
    fn from(e: odontogram::OdontogramError) -> Self {
        ClinicError::Validation(e.to_string())
    }
}

impl From<models::ValidationError> for ClinicError {
    fn from(e: models::ValidationError) -> Self {
        ClinicError::Validation(e.to_string())
    }
}

impl From<access::AccessError> for ClinicError {
    fn from(e: access::AccessError) -> Self {
        ClinicError::PermissionDenied(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::Serialization(e.to_string())
    }
}

impl From<anyhow::Error> for ClinicError {
    fn from(e: anyhow::Error) -> Self {
        ClinicError::Configuration(format!("{:#}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::Database(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DentalClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(DentalClinicCore::new(db, &ClinicConfig::default())))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DentalClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(DentalClinicCore::new(db, &ClinicConfig::default())))
}

/// Load configuration (file plus `DENTAL_CLINIC_*` environment), install
/// logging and open the configured database.
#[uniffi::export]
pub fn open_with_config(config_path: Option<String>) -> Result<Arc<DentalClinicCore>, ClinicError> {
    let config = ClinicConfig::load(config_path.as_deref().map(Path::new))?;
    config::init_tracing(&config.log_filter);
    info!(
        app = config::APP_NAME,
        version = config::APP_VERSION,
        conflict_policy = ?config.scheduling.conflict_policy,
        "starting clinic core"
    );

    let db = match &config.database_path {
        Some(path) => Database::open(path)?,
        None => Database::open_in_memory()?,
    };
    Ok(Arc::new(DentalClinicCore::new(db, &config)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
#[derive(uniffi::Object)]
pub struct DentalClinicCore {
    db: Arc<Mutex<Database>>,
    scheduling: SchedulingConfig,
    policy: AccessPolicy,
    debug: DebugContext,
    tracker: Mutex<QueryTracker>,
    backoff: Mutex<PollBackoff>,
    session_email: Mutex<Option<String>>,
}

impl DentalClinicCore {
    fn new(mut db: Database, config: &ClinicConfig) -> Self {
        db.set_conflict_policy(config.scheduling.conflict_policy);
        Self {
            db: Arc::new(Mutex::new(db)),
            scheduling: config.scheduling.clone(),
            policy: AccessPolicy::from_config(config),
            debug: DebugContext::from_config(&config.debug),
            tracker: Mutex::new(QueryTracker::new()),
            backoff: Mutex::new(PollBackoff::new(
                Duration::from_secs(config.poll.base_secs),
                Duration::from_secs(config.poll.max_secs),
            )),
            session_email: Mutex::new(None),
        }
    }

    /// Mark the queries a mutation touched as stale.
    fn invalidate(&self, keys: &[&str]) -> Result<(), ClinicError> {
        let mut tracker = self.tracker.lock()?;
        for key in keys {
            tracker.invalidate_prefix(key);
        }
        Ok(())
    }

    fn require_admin(&self, action: &str) -> Result<(), ClinicError> {
        let email = self.session_email.lock()?;
        self.policy
            .require_admin(email.as_deref(), &self.debug, action)?;
        Ok(())
    }

    fn load_patient(db: &Database, id: &str) -> Result<Patient, ClinicError> {
        db.get_patient(id)?
            .ok_or_else(|| ClinicError::NotFound(format!("patient {}", id)))
    }
}

#[uniffi::export]
impl DentalClinicCore {
    // =========================================================================
    // Session
    // =========================================================================

    /// Set the signed-in account used for administrator checks.
    pub fn set_session_email(&self, email: Option<String>) -> Result<(), ClinicError> {
        *self.session_email.lock()? = email;
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, form: FfiNewPatient) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        let patient = form.into_patient()?;
        db.insert_patient(&patient)?;
        let stored = Self::load_patient(&db, &patient.id)?;
        drop(db);

        self.invalidate(&[keys::PATIENTS, keys::DASHBOARD])?;
        Ok(stored.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        Ok(Self::load_patient(&db, &id)?.into())
    }

    /// All patients, by last name.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name, email or phone; best matches first.
    pub fn search_patients(&self, query: String, limit: u32) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let matches = db.search_patients(&query, limit as usize)?;
        Ok(matches.into_iter().map(|m| m.patient.into()).collect())
    }

    /// Replace a patient's details, keeping id and creation time.
    pub fn update_patient(&self, id: String, form: FfiNewPatient) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        let current = Self::load_patient(&db, &id)?;
        let mut patient = form.into_patient()?;
        patient.id = current.id;
        patient.created_at = current.created_at;
        db.update_patient(&patient)?;
        let stored = Self::load_patient(&db, &id)?;
        drop(db);

        self.invalidate(&[keys::PATIENTS])?;
        Ok(stored.into())
    }

    /// Patients assigned to a doctor.
    pub fn list_patients_for_doctor(&self, doctor_id: String) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patients = db.list_patients_for_doctor(&doctor_id)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Delete a patient and their clinical records. Administrators only.
    /// Patients with invoices on file are refused with a conflict.
    pub fn delete_patient(&self, id: String) -> Result<bool, ClinicError> {
        self.require_admin("delete patient")?;
        let deleted = self.db.lock()?.delete_patient(&id)?;
        self.invalidate(&[
            keys::PATIENTS,
            keys::APPOINTMENTS,
            keys::TREATMENTS,
            keys::ODONTOGRAMS,
            keys::DASHBOARD,
        ])?;
        Ok(deleted)
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Register a doctor.
    pub fn create_doctor(
        &self,
        first_name: String,
        last_name: String,
        specialization: Option<String>,
    ) -> Result<FfiDoctor, ClinicError> {
        let mut doctor = Doctor::new(first_name, last_name);
        doctor.specialization = specialization;
        self.db.lock()?.insert_doctor(&doctor)?;
        Ok(doctor.into())
    }

    /// Active doctors.
    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_doctors()?.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Validate and book a new appointment.
    pub fn create_appointment(
        &self,
        form: FfiNewAppointment,
    ) -> Result<FfiScheduledAppointment, ClinicError> {
        let today = schedule::today_canonical();
        let form = schedule::validate_new_appointment(&form.into(), &today)?;
        let appointment = Appointment::from_form(&form);

        let overlapping_ids = self.db.lock()?.insert_appointment(&appointment)?;
        self.invalidate(&[keys::APPOINTMENTS, keys::DASHBOARD])?;

        Ok(FfiScheduledAppointment {
            appointment: appointment.try_into()?,
            overlapping_ids,
        })
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: String) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        db.get_appointment(&id)?
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {}", id)))?
            .try_into()
    }

    /// Appointments with names for a day filter, by date then start time.
    pub fn list_appointments(
        &self,
        filter: FfiDayFilter,
    ) -> Result<Vec<FfiAppointmentDetails>, ClinicError> {
        let today = schedule::today_canonical();
        let db = self.db.lock()?;
        db.list_appointment_details_for(&filter.into(), &today)?
            .into_iter()
            .map(FfiAppointmentDetails::try_from)
            .collect()
    }

    /// Move an appointment to any status. Only the status is written.
    pub fn change_appointment_status(
        &self,
        id: String,
        status: String,
        expected_revision: Option<String>,
    ) -> Result<FfiScheduledAppointment, ClinicError> {
        let status: AppointmentStatus = status.parse()?;
        let (updated, overlapping_ids) = self.db.lock()?.patch_appointment(
            &id,
            &AppointmentPatch::status(status),
            expected_revision.as_deref(),
        )?;
        self.invalidate(&[keys::APPOINTMENTS, keys::DASHBOARD])?;
        Ok(FfiScheduledAppointment {
            appointment: updated.try_into()?,
            overlapping_ids,
        })
    }

    /// Move an appointment to another day or block. Without an end time the
    /// block lasts one hour.
    pub fn reschedule_appointment(
        &self,
        id: String,
        date: String,
        start_time: String,
        end_time: Option<String>,
        expected_revision: Option<String>,
    ) -> Result<FfiScheduledAppointment, ClinicError> {
        let start: TimeOfDay = start_time.parse()?;
        let end = match end_time {
            Some(end) => end,
            None => TimeBlock::one_hour_from(start).end.to_string(),
        };
        let patch = AppointmentPatch {
            date: Some(date),
            start_time: Some(start.to_string()),
            end_time: Some(end),
            ..Default::default()
        };
        let (updated, overlapping_ids) = self
            .db
            .lock()?
            .patch_appointment(&id, &patch, expected_revision.as_deref())?;
        self.invalidate(&[keys::APPOINTMENTS, keys::DASHBOARD])?;
        Ok(FfiScheduledAppointment {
            appointment: updated.try_into()?,
            overlapping_ids,
        })
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: String) -> Result<bool, ClinicError> {
        let deleted = self.db.lock()?.delete_appointment(&id)?;
        self.invalidate(&[keys::APPOINTMENTS, keys::DASHBOARD])?;
        Ok(deleted)
    }

    /// Replace every editable field of an appointment. Past dates are
    /// allowed; status and creation time are kept.
    pub fn edit_appointment(
        &self,
        id: String,
        form: FfiNewAppointment,
        expected_revision: Option<String>,
    ) -> Result<FfiScheduledAppointment, ClinicError> {
        let form = schedule::validate_appointment_edit(&form.into())?;
        let db = self.db.lock()?;
        let current = db
            .get_appointment(&id)?
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {}", id)))?;
        if !revision::matches_revision(&current, expected_revision.as_deref())? {
            return Err(ClinicError::Conflict(format!(
                "edit appointment: {} was modified by someone else",
                id
            )));
        }

        let mut updated = Appointment::from_form(&form);
        updated.id = current.id;
        updated.status = current.status;
        updated.created_at = current.created_at;
        let overlapping_ids = db.update_appointment(&updated)?;
        let stored = db
            .get_appointment(&id)?
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {}", id)))?;
        drop(db);

        self.invalidate(&[keys::APPOINTMENTS, keys::DASHBOARD])?;
        Ok(FfiScheduledAppointment {
            appointment: stored.try_into()?,
            overlapping_ids,
        })
    }

    /// A patient's appointments, by date then start time.
    pub fn list_patient_appointments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        db.list_appointments_for_patient(&patient_id)?
            .into_iter()
            .map(FfiAppointment::try_from)
            .collect()
    }

    /// The one-hour blocks offered by the appointment form.
    pub fn common_time_blocks(&self) -> Vec<FfiTimeBlock> {
        TimeBlock::common_blocks()
            .into_iter()
            .map(|block| FfiTimeBlock {
                start: block.start.to_string(),
                end: block.end.to_string(),
                label: block.display_label(),
            })
            .collect()
    }

    /// Statuses reachable from `status` (every other status).
    pub fn status_actions(&self, status: String) -> Result<Vec<String>, ClinicError> {
        let status: AppointmentStatus = status.parse()?;
        Ok(schedule::available_actions(status)
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect())
    }

    /// Slot start times inside business hours not taken by the doctor.
    pub fn available_slots(&self, doctor_id: String, date: String) -> Result<Vec<String>, ClinicError> {
        let date = schedule::normalize_date_str(&date)?;
        let (open, close) = self.scheduling.business_hours()?;

        let db = self.db.lock()?;
        let mut taken = Vec::new();
        for appointment in db.list_appointments_for_doctor_on(&doctor_id, &date)? {
            if appointment.status.blocks_schedule() {
                taken.push(TimeBlock::parse(&appointment.start_time, &appointment.end_time)?);
            }
        }

        Ok(
            schedule::slots_between(open, close, self.scheduling.slot_minutes)
                .into_iter()
                .filter(|slot| !taken.iter().any(|b| b.start <= *slot && *slot < b.end))
                .map(|slot| slot.to_string())
                .collect(),
        )
    }

    // =========================================================================
    // Odontogram Operations
    // =========================================================================

    /// Save a patient's chart for a date from the edited teeth.
    ///
    /// `dentition` overrides the catalog implied by the patient record
    /// ("adult" or "pediatric").
    pub fn save_odontogram(
        &self,
        patient_id: String,
        date: String,
        teeth: Vec<FfiToothEntry>,
        notes: Option<String>,
        dentition: Option<String>,
    ) -> Result<FfiOdontogram, ClinicError> {
        let date = schedule::normalize_date_str(&date)?;
        let db = self.db.lock()?;
        let patient = Self::load_patient(&db, &patient_id)?;

        let mut chart = ToothChart::new(Odontogram::new(patient.id, date, patient.is_pediatric));
        if let Some(dentition) = dentition {
            chart = chart.with_dentition(parse_dentition(&dentition)?);
        }
        for entry in teeth {
            chart.apply(entry.into_edit()?)?;
        }
        chart.set_notes(notes);

        let stored = db.upsert_odontogram(&chart.into_odontogram())?;
        drop(db);

        self.invalidate(&[keys::ODONTOGRAMS])?;
        Ok(stored.into())
    }

    /// Most recent chart of a patient, if any.
    pub fn get_latest_odontogram(
        &self,
        patient_id: String,
    ) -> Result<Option<FfiOdontogram>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_latest_odontogram(&patient_id)?.map(|o| o.into()))
    }

    /// Every chart of a patient, newest first.
    pub fn list_odontograms(&self, patient_id: String) -> Result<Vec<FfiOdontogram>, ClinicError> {
        let db = self.db.lock()?;
        let charts = db.list_odontograms_for_patient(&patient_id)?;
        Ok(charts.into_iter().map(|o| o.into()).collect())
    }

    /// Treatments implied by the latest chart, by tooth number.
    pub fn suggest_treatments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiSuggestedTreatment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .get_latest_odontogram(&patient_id)?
            .map(|chart| odontogram::suggest_treatments(&chart.teeth))
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.into())
            .collect())
    }

    /// Turn the latest chart's suggestions into planned treatments.
    pub fn plan_suggested_treatments(
        &self,
        patient_id: String,
        doctor_id: String,
    ) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        let chart = db
            .get_latest_odontogram(&patient_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("odontogram for patient {}", patient_id)))?;
        let created =
            db.create_suggested_treatments(&chart, &doctor_id, &schedule::today_canonical())?;
        drop(db);

        self.invalidate(&[keys::TREATMENTS])?;
        Ok(created.into_iter().map(|t| t.into()).collect())
    }

    // =========================================================================
    // Treatment Operations
    // =========================================================================

    /// A patient's treatments, newest first.
    pub fn list_treatments(&self, patient_id: String) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        let treatments = db.list_treatments_for_patient(&patient_id)?;
        Ok(treatments.into_iter().map(|t| t.into()).collect())
    }

    /// Plan a treatment by hand.
    pub fn create_treatment(&self, form: FfiNewTreatment) -> Result<FfiTreatment, ClinicError> {
        let treatment = form.into_treatment()?;
        self.db.lock()?.insert_treatment(&treatment)?;
        self.invalidate(&[keys::TREATMENTS])?;
        Ok(treatment.into())
    }

    /// Replace the editable fields of a treatment. Patient, status and
    /// completion date are kept.
    pub fn update_treatment(
        &self,
        id: String,
        form: FfiNewTreatment,
    ) -> Result<FfiTreatment, ClinicError> {
        let db = self.db.lock()?;
        let current = db
            .get_treatment(&id)?
            .ok_or_else(|| ClinicError::NotFound(format!("treatment {}", id)))?;
        let mut treatment = form.into_treatment()?;
        treatment.id = current.id;
        treatment.patient_id = current.patient_id;
        treatment.status = current.status;
        treatment.end_date = current.end_date;
        treatment.suggested_from_odontogram = current.suggested_from_odontogram;
        db.update_treatment(&treatment)?;
        drop(db);

        self.invalidate(&[keys::TREATMENTS, keys::DASHBOARD])?;
        Ok(treatment.into())
    }

    /// Delete a treatment.
    pub fn delete_treatment(&self, id: String) -> Result<bool, ClinicError> {
        let deleted = self.db.lock()?.delete_treatment(&id)?;
        self.invalidate(&[keys::TREATMENTS, keys::DASHBOARD])?;
        Ok(deleted)
    }

    /// Mark a treatment completed today.
    pub fn complete_treatment(&self, id: String) -> Result<FfiTreatment, ClinicError> {
        let treatment = self
            .db
            .lock()?
            .complete_treatment(&id, &schedule::today_canonical())?;
        self.invalidate(&[keys::TREATMENTS, keys::DASHBOARD])?;
        Ok(treatment.into())
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    /// Create an invoice from explicit lines.
    pub fn create_invoice(&self, form: FfiNewInvoice) -> Result<FfiInvoice, ClinicError> {
        let invoice = form.into_invoice()?;
        let stored = self.db.lock()?.insert_invoice(&invoice)?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(stored.into())
    }

    /// Bill every completed treatment of a patient in one draft invoice.
    pub fn create_invoice_from_treatments(
        &self,
        patient_id: String,
        due_date: String,
    ) -> Result<FfiInvoice, ClinicError> {
        let due_date = schedule::normalize_date_str(&due_date)?;
        let db = self.db.lock()?;
        let treatments = db.list_treatments_for_patient(&patient_id)?;
        let invoice = Invoice::from_treatments(
            patient_id,
            schedule::today_canonical(),
            due_date,
            &treatments,
        );
        if invoice.items.is_empty() {
            return Err(ClinicError::Validation(
                "create invoice: patient has no completed treatments".to_string(),
            ));
        }
        let stored = db.insert_invoice(&invoice)?;
        drop(db);

        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(stored.into())
    }

    /// Replace the lines, dates and adjustments of an open invoice.
    pub fn update_invoice(&self, id: String, form: FfiNewInvoice) -> Result<FfiInvoice, ClinicError> {
        let edited = form.into_invoice()?;
        let invoice = self.db.lock()?.revise_invoice(&id, edited)?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(invoice.into())
    }

    /// Issue a draft invoice to the patient.
    pub fn send_invoice(&self, id: String) -> Result<FfiInvoice, ClinicError> {
        let invoice = self.db.lock()?.send_invoice(&id)?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(invoice.into())
    }

    /// Void an unpaid invoice.
    pub fn cancel_invoice(&self, id: String) -> Result<FfiInvoice, ClinicError> {
        let invoice = self.db.lock()?.cancel_invoice(&id)?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(invoice.into())
    }

    /// Register a payment dated today.
    pub fn record_payment(&self, invoice_id: String, amount: f64) -> Result<FfiInvoice, ClinicError> {
        let invoice = self.db.lock()?.record_invoice_payment(
            &invoice_id,
            amount,
            &schedule::today_canonical(),
        )?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(invoice.into())
    }

    /// Invoices for one patient or everyone, newest first.
    pub fn list_invoices(&self, patient_id: Option<String>) -> Result<Vec<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        let invoices = match patient_id {
            Some(id) => db.list_invoices_for_patient(&id)?,
            None => db.list_invoices()?,
        };
        Ok(invoices.into_iter().map(|i| i.into()).collect())
    }

    /// Flag sent invoices past their due date as overdue.
    pub fn mark_overdue_invoices(&self) -> Result<u32, ClinicError> {
        let count = self
            .db
            .lock()?
            .mark_overdue_invoices(&schedule::today_canonical())?;
        if count > 0 {
            self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        }
        Ok(count as u32)
    }

    /// Delete an invoice. Administrators only.
    pub fn delete_invoice(&self, id: String) -> Result<bool, ClinicError> {
        self.require_admin("delete invoice")?;
        let deleted = self.db.lock()?.delete_invoice(&id)?;
        self.invalidate(&[keys::INVOICES, keys::DASHBOARD])?;
        Ok(deleted)
    }

    /// Export invoices as JSON, for one patient or everyone.
    pub fn export_invoices_json(&self, patient_id: Option<String>) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let exporter = export::InvoiceExporter::new(&db);
        let batch = match patient_id {
            Some(id) => exporter.export_for_patient(&id)?,
            None => exporter.export_all()?,
        };
        Ok(batch.to_json()?)
    }

    /// Export invoices as CSV, one row per line item.
    pub fn export_invoices_csv(&self, patient_id: Option<String>) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let exporter = export::InvoiceExporter::new(&db);
        let batch = match patient_id {
            Some(id) => exporter.export_for_patient(&id)?,
            None => exporter.export_all()?,
        };
        Ok(batch.to_csv())
    }

    // =========================================================================
    // Inventory Operations
    // =========================================================================

    /// Add a stocked item.
    pub fn add_inventory_item(&self, item: FfiInventoryItem) -> Result<FfiInventoryItem, ClinicError> {
        let item: InventoryItem = item.into();
        self.db.lock()?.insert_inventory_item(&item)?;
        self.invalidate(&[keys::INVENTORY, keys::DASHBOARD])?;
        Ok(item.into())
    }

    /// Add stock to an item.
    pub fn restock_item(&self, id: String, amount: u32) -> Result<FfiInventoryItem, ClinicError> {
        let item = self.db.lock()?.restock_inventory_item(&id, amount)?;
        self.invalidate(&[keys::INVENTORY, keys::DASHBOARD])?;
        Ok(item.into())
    }

    /// Take stock out of an item; never below zero.
    pub fn consume_item(&self, id: String, amount: u32) -> Result<FfiInventoryItem, ClinicError> {
        let item = self.db.lock()?.consume_inventory_item(&id, amount)?;
        self.invalidate(&[keys::INVENTORY, keys::DASHBOARD])?;
        Ok(item.into())
    }

    /// Replace an item's details. Stock level is taken from the form.
    pub fn update_inventory_item(
        &self,
        item: FfiInventoryItem,
    ) -> Result<FfiInventoryItem, ClinicError> {
        let db = self.db.lock()?;
        let current = db
            .get_inventory_item(&item.id)?
            .ok_or_else(|| ClinicError::NotFound(format!("inventory item {}", item.id)))?;
        let mut updated: InventoryItem = item.into();
        updated.last_restocked = current.last_restocked;
        db.update_inventory_item(&updated)?;
        drop(db);

        self.invalidate(&[keys::INVENTORY, keys::DASHBOARD])?;
        Ok(updated.into())
    }

    /// Remove an item from the inventory.
    pub fn delete_inventory_item(&self, id: String) -> Result<bool, ClinicError> {
        let deleted = self.db.lock()?.delete_inventory_item(&id)?;
        self.invalidate(&[keys::INVENTORY, keys::DASHBOARD])?;
        Ok(deleted)
    }

    /// Every stocked item, by category then name.
    pub fn list_inventory(&self) -> Result<Vec<FfiInventoryItem>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_inventory()?.into_iter().map(|i| i.into()).collect())
    }

    /// Items strictly below their minimum quantity.
    pub fn list_low_stock(&self) -> Result<Vec<FfiInventoryItem>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_low_stock()?.into_iter().map(|i| i.into()).collect())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Dashboard numbers for today.
    pub fn dashboard_summary(&self) -> Result<FfiDashboardSummary, ClinicError> {
        let db = self.db.lock()?;
        let summary =
            reports::ReportBuilder::new(&db).dashboard_summary(&schedule::today_canonical())?;
        Ok(summary.into())
    }

    /// Completed-treatment revenue per doctor for a month.
    pub fn monthly_revenue(&self, year: i32, month: u32) -> Result<Vec<FfiDoctorRevenue>, ClinicError> {
        let db = self.db.lock()?;
        let revenue = reports::ReportBuilder::new(&db).monthly_revenue_by_doctor(year, month)?;
        Ok(revenue.into_iter().map(|r| r.into()).collect())
    }

    /// Appointment counts per status between two dates, inclusive.
    pub fn appointment_status_breakdown(
        &self,
        from: String,
        to: String,
    ) -> Result<Vec<FfiStatusCount>, ClinicError> {
        let from = schedule::normalize_date_str(&from)?;
        let to = schedule::normalize_date_str(&to)?;
        let db = self.db.lock()?;
        let breakdown = reports::ReportBuilder::new(&db).appointment_status_breakdown(&from, &to)?;
        Ok(breakdown
            .into_iter()
            .map(|c| FfiStatusCount {
                status: c.status.as_str().to_string(),
                count: c.count,
            })
            .collect())
    }

    // =========================================================================
    // Refresh Tracking
    // =========================================================================

    /// Start a fetch for `key`; returns the generation to hand back later.
    pub fn begin_refresh(&self, key: String) -> Result<u64, ClinicError> {
        Ok(self.tracker.lock()?.begin(&key).generation())
    }

    /// Whether a fetch started with `generation` may still be applied.
    pub fn is_refresh_current(&self, key: String, generation: u64) -> Result<bool, ClinicError> {
        Ok(self.tracker.lock()?.is_latest(&key, generation))
    }

    /// Whether a mutation invalidated `key` since its last fetch began.
    pub fn needs_refresh(&self, key: String) -> Result<bool, ClinicError> {
        Ok(self.tracker.lock()?.needs_refresh(&key))
    }

    /// Milliseconds until the next fallback poll. Unchanged results stretch
    /// the interval; a change snaps it back to the base.
    pub fn next_poll_interval_ms(&self, changed: bool) -> Result<u64, ClinicError> {
        let interval = self.backoff.lock()?.next_interval(changed);
        Ok(interval.as_millis() as u64)
    }
}

fn parse_dentition(raw: &str) -> Result<Dentition, ClinicError> {
    match raw.trim().to_lowercase().as_str() {
        "adult" => Ok(Dentition::Adult),
        "pediatric" => Ok(Dentition::Pediatric),
        other => Err(ClinicError::Validation(format!(
            "save odontogram: unknown dentition '{}'",
            other
        ))),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe legal guardian.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLegalGuardian {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
}

impl From<FfiLegalGuardian> for models::LegalGuardian {
    fn from(g: FfiLegalGuardian) -> Self {
        models::LegalGuardian {
            name: g.name,
            relationship: g.relationship,
            phone: g.phone,
            email: g.email,
        }
    }
}

impl From<models::LegalGuardian> for FfiLegalGuardian {
    fn from(g: models::LegalGuardian) -> Self {
        Self {
            name: g.name,
            relationship: g.relationship,
            phone: g.phone,
            email: g.email,
        }
    }
}

/// FFI-safe new patient form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Vec<String>,
    pub is_pediatric: bool,
    pub legal_guardian: Option<FfiLegalGuardian>,
    pub assigned_doctor_id: Option<String>,
}

impl FfiNewPatient {
    fn into_patient(self) -> Result<Patient, ClinicError> {
        let mut patient = Patient::new(self.first_name, self.last_name);
        patient.email = self.email;
        patient.phone = self.phone;
        patient.address = self.address;
        patient.date_of_birth = self
            .date_of_birth
            .map(|d| schedule::normalize_date_str(&d))
            .transpose()?;
        patient.insurance_provider = self.insurance_provider;
        patient.insurance_number = self.insurance_number;
        patient.medical_history = self.medical_history.unwrap_or_default();
        patient.allergies = self.allergies;
        patient.is_pediatric = self.is_pediatric;
        patient.legal_guardian = self.legal_guardian.map(Into::into);
        patient.assigned_doctor = self.assigned_doctor_id.map(|id| models::AssignedDoctor {
            id,
            name: String::new(),
            specialization: None,
        });
        Ok(patient)
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub medical_history: String,
    pub allergies: Vec<String>,
    pub is_pediatric: bool,
    pub legal_guardian: Option<FfiLegalGuardian>,
    pub assigned_doctor_id: Option<String>,
    pub assigned_doctor_name: Option<String>,
    pub assigned_doctor_specialization: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        let (assigned_doctor_id, assigned_doctor_name, assigned_doctor_specialization) =
            match patient.assigned_doctor {
                Some(doctor) => (Some(doctor.id), Some(doctor.name), doctor.specialization),
                None => (None, None, None),
            };
        Self {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
            address: patient.address,
            date_of_birth: patient.date_of_birth,
            insurance_provider: patient.insurance_provider,
            insurance_number: patient.insurance_number,
            medical_history: patient.medical_history,
            allergies: patient.allergies,
            is_pediatric: patient.is_pediatric,
            legal_guardian: patient.legal_guardian.map(Into::into),
            assigned_doctor_id,
            assigned_doctor_name,
            assigned_doctor_specialization,
        }
    }
}

/// Prefill an edit form from a stored patient.
impl From<FfiPatient> for FfiNewPatient {
    fn from(patient: FfiPatient) -> Self {
        Self {
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
            address: patient.address,
            date_of_birth: patient.date_of_birth,
            insurance_provider: patient.insurance_provider,
            insurance_number: patient.insurance_number,
            medical_history: Some(patient.medical_history).filter(|h| !h.is_empty()),
            allergies: patient.allergies,
            is_pediatric: patient.is_pediatric,
            legal_guardian: patient.legal_guardian,
            assigned_doctor_id: patient.assigned_doctor_id,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub specialization: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            name: doctor.full_name(),
            id: doctor.id,
            specialization: doctor.specialization,
        }
    }
}

/// FFI-safe appointment form. Dates and times may use any accepted format.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
    pub treatment_type: Option<String>,
}

impl From<FfiNewAppointment> for NewAppointment {
    fn from(form: FfiNewAppointment) -> Self {
        NewAppointment {
            patient_id: form.patient_id,
            doctor_id: form.doctor_id,
            date: form.date,
            start_time: form.start_time,
            end_time: form.end_time,
            notes: form.notes,
            treatment_type: form.treatment_type,
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub treatment_type: Option<String>,
    /// Pass back with an edit to refuse it if someone else changed the record
    pub revision: String,
}

impl TryFrom<Appointment> for FfiAppointment {
    type Error = ClinicError;

    fn try_from(appointment: Appointment) -> Result<Self, Self::Error> {
        let revision = revision::fingerprint(&appointment)?;
        Ok(Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status.as_str().to_string(),
            notes: appointment.notes,
            treatment_type: appointment.treatment_type,
            revision,
        })
    }
}

/// A booked appointment plus any overlaps tolerated by the conflict policy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScheduledAppointment {
    pub appointment: FfiAppointment,
    pub overlapping_ids: Vec<String>,
}

/// A pickable time block.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTimeBlock {
    pub start: String,
    pub end: String,
    /// 12-hour display text
    pub label: String,
}

/// FFI-safe appointment with display names.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentDetails {
    pub appointment: FfiAppointment,
    pub patient_name: String,
    pub doctor_name: String,
}

impl TryFrom<models::AppointmentDetails> for FfiAppointmentDetails {
    type Error = ClinicError;

    fn try_from(details: models::AppointmentDetails) -> Result<Self, Self::Error> {
        Ok(Self {
            appointment: details.appointment.try_into()?,
            patient_name: details.patient_name,
            doctor_name: details.doctor_name,
        })
    }
}

/// Which days to list.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiDayFilter {
    Today,
    Tomorrow,
    Upcoming,
    On { date: String },
}

impl From<FfiDayFilter> for DayFilter {
    fn from(filter: FfiDayFilter) -> Self {
        match filter {
            FfiDayFilter::Today => DayFilter::Today,
            FfiDayFilter::Tomorrow => DayFilter::Tomorrow,
            FfiDayFilter::Upcoming => DayFilter::Upcoming,
            FfiDayFilter::On { date } => DayFilter::On(date),
        }
    }
}

/// FFI-safe tooth entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiToothEntry {
    pub tooth: u8,
    pub status: String,
    pub surfaces: Vec<String>,
    pub notes: Option<String>,
}

impl FfiToothEntry {
    fn into_edit(self) -> Result<ToothEdit, ClinicError> {
        let surfaces = self
            .surfaces
            .iter()
            .map(|s| s.parse::<models::Surface>())
            .collect::<Result<Vec<_>, _>>()?;
        let mut edit = ToothEdit::status(self.tooth, self.status.parse()?).with_surfaces(surfaces);
        edit.notes = self.notes;
        Ok(edit)
    }
}

/// FFI-safe suggested treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSuggestedTreatment {
    pub tooth: u8,
    pub treatment_type: String,
    pub cost: f64,
}

impl From<SuggestedTreatment> for FfiSuggestedTreatment {
    fn from(s: SuggestedTreatment) -> Self {
        Self {
            tooth: s.tooth,
            treatment_type: s.treatment_type,
            cost: s.cost,
        }
    }
}

/// FFI-safe odontogram.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOdontogram {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub is_pediatric: bool,
    pub notes: Option<String>,
    /// Only teeth with a recorded condition; absent teeth are healthy
    pub teeth: Vec<FfiToothEntry>,
    pub suggestions: Vec<FfiSuggestedTreatment>,
    pub estimated_cost: f64,
}

impl From<Odontogram> for FfiOdontogram {
    fn from(chart: Odontogram) -> Self {
        let suggestions = odontogram::suggest_treatments(&chart.teeth);
        let estimated_cost = odontogram::estimated_cost(&suggestions);
        let mut teeth: Vec<FfiToothEntry> = chart
            .teeth
            .iter()
            .filter_map(|(key, condition)| {
                Some(FfiToothEntry {
                    tooth: odontogram::parse_tooth_key(key)?,
                    status: condition.status.as_str().to_string(),
                    surfaces: condition
                        .surfaces
                        .iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                    notes: condition.notes.clone(),
                })
            })
            .collect();
        teeth.sort_by_key(|t| t.tooth);

        Self {
            id: chart.id,
            patient_id: chart.patient_id,
            date: chart.date,
            is_pediatric: chart.is_pediatric,
            notes: chart.notes,
            teeth,
            suggestions: suggestions.into_iter().map(|s| s.into()).collect(),
            estimated_cost,
        }
    }
}

/// FFI-safe treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub treatment_type: String,
    pub description: String,
    pub teeth: Vec<u8>,
    pub status: String,
    pub cost: f64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub suggested_from_odontogram: bool,
}

impl From<Treatment> for FfiTreatment {
    fn from(t: Treatment) -> Self {
        Self {
            id: t.id,
            patient_id: t.patient_id,
            doctor_id: t.doctor_id,
            treatment_type: t.treatment_type,
            description: t.description,
            teeth: t.teeth,
            status: t.status.as_str().to_string(),
            cost: t.cost,
            start_date: t.start_date,
            end_date: t.end_date,
            notes: t.notes,
            suggested_from_odontogram: t.suggested_from_odontogram,
        }
    }
}

/// FFI-safe treatment form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewTreatment {
    pub patient_id: String,
    pub doctor_id: String,
    pub treatment_type: String,
    /// Defaults to the treatment type
    pub description: Option<String>,
    pub teeth: Vec<u8>,
    pub cost: f64,
    /// Defaults to today
    pub start_date: Option<String>,
    pub notes: Option<String>,
}

impl FfiNewTreatment {
    fn into_treatment(self) -> Result<Treatment, ClinicError> {
        let start_date = match self.start_date {
            Some(date) => schedule::normalize_date_str(&date)?,
            None => schedule::today_canonical(),
        };
        let mut treatment = Treatment::new(
            self.patient_id,
            self.doctor_id,
            self.treatment_type,
            self.cost,
            start_date,
        );
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            treatment.description = description;
        }
        treatment.teeth = self.teeth;
        treatment.notes = self.notes;
        Ok(treatment)
    }
}

/// FFI-safe invoice line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// Ignored on input; recomputed from quantity and unit price
    pub total: f64,
}

impl From<InvoiceItem> for FfiInvoiceItem {
    fn from(item: InvoiceItem) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        }
    }
}

/// FFI-safe new invoice form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewInvoice {
    pub patient_id: String,
    /// Defaults to today
    pub date: Option<String>,
    pub due_date: String,
    pub items: Vec<FfiInvoiceItem>,
    pub tax: f64,
    pub discount: f64,
    pub notes: Option<String>,
}

impl FfiNewInvoice {
    fn into_invoice(self) -> Result<Invoice, ClinicError> {
        let date = match self.date {
            Some(date) => schedule::normalize_date_str(&date)?,
            None => schedule::today_canonical(),
        };
        let due_date = schedule::normalize_date_str(&self.due_date)?;

        let mut invoice = Invoice::new(self.patient_id, date, due_date);
        for item in self.items {
            invoice.add_item(InvoiceItem::new(item.description, item.quantity, item.unit_price));
        }
        invoice.set_adjustments(self.tax, self.discount);
        invoice.notes = self.notes;
        Ok(invoice)
    }
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub due_date: String,
    pub items: Vec<FfiInvoiceItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub status: String,
    pub paid_amount: f64,
    pub balance_due: f64,
}

impl From<Invoice> for FfiInvoice {
    fn from(invoice: Invoice) -> Self {
        let balance_due = invoice.balance_due();
        Self {
            id: invoice.id,
            patient_id: invoice.patient_id,
            date: invoice.date,
            due_date: invoice.due_date,
            items: invoice.items.into_iter().map(|i| i.into()).collect(),
            subtotal: invoice.subtotal,
            tax: invoice.tax,
            discount: invoice.discount,
            total: invoice.total,
            status: invoice.status.as_str().to_string(),
            paid_amount: invoice.paid_amount,
            balance_due,
        }
    }
}

/// FFI-safe inventory item. An empty id on input gets a fresh one.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit: String,
    pub min_quantity: u32,
    pub price: f64,
    pub supplier: Option<String>,
    pub shortfall: u32,
}

impl From<InventoryItem> for FfiInventoryItem {
    fn from(item: InventoryItem) -> Self {
        Self {
            shortfall: item.shortfall(),
            id: item.id,
            name: item.name,
            category: item.category,
            quantity: item.quantity,
            unit: item.unit,
            min_quantity: item.min_quantity,
            price: item.price,
            supplier: item.supplier,
        }
    }
}

impl From<FfiInventoryItem> for InventoryItem {
    fn from(item: FfiInventoryItem) -> Self {
        let mut stored = InventoryItem::new(item.name, item.category, item.unit);
        if !item.id.trim().is_empty() {
            stored.id = item.id;
        }
        stored.quantity = item.quantity;
        stored.min_quantity = item.min_quantity;
        stored.price = item.price;
        stored.supplier = item.supplier;
        stored
    }
}

/// FFI-safe dashboard summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboardSummary {
    pub total_patients: u32,
    pub appointments_today: u32,
    pub appointments_upcoming: u32,
    pub pending_invoices: u32,
    pub revenue_this_month: f64,
    pub low_stock_items: u32,
}

impl From<reports::DashboardSummary> for FfiDashboardSummary {
    fn from(s: reports::DashboardSummary) -> Self {
        Self {
            total_patients: s.total_patients,
            appointments_today: s.appointments_today,
            appointments_upcoming: s.appointments_upcoming,
            pending_invoices: s.pending_invoices,
            revenue_this_month: s.revenue_this_month,
            low_stock_items: s.low_stock_items,
        }
    }
}

/// FFI-safe revenue row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctorRevenue {
    pub doctor_id: String,
    pub doctor_name: String,
    pub revenue: f64,
    pub completed_treatments: u32,
}

impl From<reports::DoctorRevenue> for FfiDoctorRevenue {
    fn from(r: reports::DoctorRevenue) -> Self {
        Self {
            doctor_id: r.doctor_id,
            doctor_name: r.doctor_name,
            revenue: r.revenue,
            completed_treatments: r.completed_treatments,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatusCount {
    pub status: String,
    pub count: u32,
}
