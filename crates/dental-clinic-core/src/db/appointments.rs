//! Appointment database operations.
//!
//! Writes go through the scheduling rules: dates and times must already be
//! canonical, blocks must be well-formed, and overlaps for the same doctor
//! are handled by the database's [`ConflictPolicy`](crate::schedule::ConflictPolicy).

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::{debug, info};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentDetails, AppointmentPatch, AppointmentStatus};
use crate::revision::matches_revision;
use crate::schedule::{check_conflicts, normalize_patch, validate_appointment, DayFilter};

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, date, start_time, end_time, \
     status, notes, treatment_type, created_at, updated_at";

struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    start_time: String,
    end_time: String,
    status: String,
    notes: Option<String>,
    treatment_type: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            date: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            status: row.get(6)?,
            notes: row.get(7)?,
            treatment_type: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status.parse()?,
            notes: row.notes,
            treatment_type: row.treatment_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct DetailsRow {
    appointment: AppointmentRow,
    patient_name: String,
    doctor_name: String,
}

impl DetailsRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            appointment: AppointmentRow::from_row(row)?,
            patient_name: row.get(11)?,
            doctor_name: row.get(12)?,
        })
    }
}

impl TryFrom<DetailsRow> for AppointmentDetails {
    type Error = DbError;

    fn try_from(row: DetailsRow) -> Result<Self, Self::Error> {
        Ok(AppointmentDetails {
            appointment: row.appointment.try_into()?,
            patient_name: row.patient_name,
            doctor_name: row.doctor_name,
        })
    }
}

/// Columns a patch writes, paired with their new values.
fn patch_assignments(patch: &AppointmentPatch) -> Vec<(&'static str, Value)> {
    let text = |v: &String| Value::Text(v.clone());
    let nullable = |v: &Option<String>| v.clone().map(Value::Text).unwrap_or(Value::Null);

    let mut assignments = Vec::new();
    if let Some(doctor_id) = &patch.doctor_id {
        assignments.push(("doctor_id", text(doctor_id)));
    }
    if let Some(date) = &patch.date {
        assignments.push(("date", text(date)));
    }
    if let Some(start_time) = &patch.start_time {
        assignments.push(("start_time", text(start_time)));
    }
    if let Some(end_time) = &patch.end_time {
        assignments.push(("end_time", text(end_time)));
    }
    if let Some(status) = patch.status {
        assignments.push(("status", Value::Text(status.as_str().to_string())));
    }
    if let Some(notes) = &patch.notes {
        assignments.push(("notes", nullable(notes)));
    }
    if let Some(treatment_type) = &patch.treatment_type {
        assignments.push(("treatment_type", nullable(treatment_type)));
    }
    assignments
}

impl Database {
    fn query_appointments<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments {} ORDER BY date, start_time",
            APPOINTMENT_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Apply the conflict policy to `candidate` against the same doctor's day.
    fn check_schedule(&self, candidate: &Appointment) -> DbResult<Vec<String>> {
        let existing = self.list_appointments_for_doctor_on(&candidate.doctor_id, &candidate.date)?;
        Ok(check_conflicts(candidate, &existing, self.conflict_policy)?)
    }

    /// Insert a new appointment.
    ///
    /// Returns the ids of overlapping appointments that were tolerated,
    /// which is only ever non-empty under the warn policy.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<Vec<String>> {
        validate_appointment(appointment)?;

        let tx = self.conn.unchecked_transaction()?;
        let overlaps = self.check_schedule(appointment)?;
        tx.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, doctor_id, date, start_time, end_time,
                status, notes, treatment_type, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                appointment.doctor_id,
                appointment.date,
                appointment.start_time,
                appointment.end_time,
                appointment.status.as_str(),
                appointment.notes,
                appointment.treatment_type,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        tx.commit()?;

        info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            date = %appointment.date,
            start = %appointment.start_time,
            "appointment created"
        );
        Ok(overlaps)
    }

    /// Replace every editable field of an existing appointment.
    ///
    /// Returns the overlapping ids tolerated by the warn policy. Fails with
    /// [`DbError::NotFound`] when no appointment has this id.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<Vec<String>> {
        validate_appointment(appointment)?;

        let tx = self.conn.unchecked_transaction()?;
        let overlaps = if appointment.status.blocks_schedule() {
            self.check_schedule(appointment)?
        } else {
            Vec::new()
        };
        let rows_affected = tx.execute(
            r#"
            UPDATE appointments SET
                patient_id = ?2,
                doctor_id = ?3,
                date = ?4,
                start_time = ?5,
                end_time = ?6,
                status = ?7,
                notes = ?8,
                treatment_type = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                appointment.doctor_id,
                appointment.date,
                appointment.start_time,
                appointment.end_time,
                appointment.status.as_str(),
                appointment.notes,
                appointment.treatment_type,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        if rows_affected == 0 {
            return Err(DbError::not_found("appointment", &appointment.id));
        }
        tx.commit()?;
        Ok(overlaps)
    }

    /// Apply a partial update, writing only the columns the patch carries.
    ///
    /// When `expected_revision` is given it must match the stored record's
    /// [`fingerprint`](crate::revision::fingerprint), otherwise the patch is
    /// refused with [`DbError::StaleRevision`]. Alongside the updated record
    /// come the overlapping ids tolerated by the warn policy.
    pub fn patch_appointment(
        &self,
        id: &str,
        patch: &AppointmentPatch,
        expected_revision: Option<&str>,
    ) -> DbResult<(Appointment, Vec<String>)> {
        let tx = self.conn.unchecked_transaction()?;
        let current = self
            .get_appointment(id)?
            .ok_or_else(|| DbError::not_found("appointment", id))?;

        if !matches_revision(&current, expected_revision)? {
            return Err(DbError::StaleRevision {
                entity: "appointment",
                id: id.to_string(),
            });
        }

        let patch = normalize_patch(patch)?;
        let mut updated = current.clone();
        if !updated.apply_patch(&patch) {
            debug!(appointment_id = %id, "patch changes nothing");
            return Ok((current, Vec::new()));
        }

        let reblocks = !current.status.blocks_schedule() && updated.status.blocks_schedule();
        let overlaps = if patch.reschedules() || reblocks {
            validate_appointment(&updated)?;
            self.check_schedule(&updated)?
        } else {
            Vec::new()
        };

        let mut assignments = patch_assignments(&patch);
        assignments.push(("updated_at", Value::Text(updated.updated_at.clone())));
        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE appointments SET {} WHERE id = ?{}",
            set_clause,
            assignments.len() + 1
        );

        let mut values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Text(id.to_string()));
        tx.execute(&sql, params_from_iter(values))?;
        tx.commit()?;

        info!(
            appointment_id = %id,
            from = %current.status,
            to = %updated.status,
            rescheduled = patch.reschedules(),
            overlaps = overlaps.len(),
            "appointment patched"
        );
        Ok((updated, overlaps))
    }

    /// Change only the status of an appointment.
    pub fn set_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> DbResult<Appointment> {
        self.patch_appointment(id, &AppointmentPatch::status(status), None)
            .map(|(appointment, _)| appointment)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        let sql = format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], AppointmentRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all appointments, by date then start time.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        self.query_appointments("", [])
    }

    /// Appointments between two canonical dates, both inclusive.
    pub fn list_appointments_between(&self, from: &str, to: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments("WHERE date BETWEEN ?1 AND ?2", params![from, to])
    }

    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments("WHERE patient_id = ?1", [patient_id])
    }

    /// One doctor's appointments on one day, cancelled ones included.
    pub fn list_appointments_for_doctor_on(
        &self,
        doctor_id: &str,
        date: &str,
    ) -> DbResult<Vec<Appointment>> {
        self.query_appointments("WHERE doctor_id = ?1 AND date = ?2", params![doctor_id, date])
    }

    /// Appointments with patient and doctor names, optionally bounded by date.
    pub fn list_appointment_details(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> DbResult<Vec<AppointmentDetails>> {
        let sql = format!(
            r#"
            SELECT {}, patient_name, doctor_name
            FROM appointment_details
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
            ORDER BY date, start_time
            "#,
            APPOINTMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![from, to], DetailsRow::from_row)?;

        let mut details = Vec::new();
        for row in rows {
            details.push(row?.try_into()?);
        }
        Ok(details)
    }

    /// Appointment details for a day filter resolved against `today`.
    pub fn list_appointment_details_for(
        &self,
        filter: &DayFilter,
        today: &str,
    ) -> DbResult<Vec<AppointmentDetails>> {
        let lower_bound = match filter {
            DayFilter::On(_) => None,
            _ => Some(today),
        };
        let mut selected = Vec::new();
        for details in self.list_appointment_details(lower_bound, None)? {
            if filter.matches(&details.appointment.date, today)? {
                selected.push(details);
            }
        }
        Ok(selected)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
