//! Treatment database operations.

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{from_json, Database, DbError, DbResult};
use crate::models::{Odontogram, Treatment, TreatmentStatus};
use crate::odontogram::suggest_treatments;

const TREATMENT_COLUMNS: &str = "id, patient_id, doctor_id, type, description, teeth, status, \
     cost, start_date, end_date, notes, suggested_from_odontogram";

struct TreatmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    treatment_type: String,
    description: String,
    teeth: String,
    status: String,
    cost: f64,
    start_date: String,
    end_date: Option<String>,
    notes: Option<String>,
    suggested_from_odontogram: bool,
}

impl TreatmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            treatment_type: row.get(3)?,
            description: row.get(4)?,
            teeth: row.get(5)?,
            status: row.get(6)?,
            cost: row.get(7)?,
            start_date: row.get(8)?,
            end_date: row.get(9)?,
            notes: row.get(10)?,
            suggested_from_odontogram: row.get(11)?,
        })
    }
}

impl TryFrom<TreatmentRow> for Treatment {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        Ok(Treatment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            treatment_type: row.treatment_type,
            description: row.description,
            teeth: from_json("teeth", &row.teeth)?,
            status: row.status.parse()?,
            cost: row.cost,
            start_date: row.start_date,
            end_date: row.end_date,
            notes: row.notes,
            suggested_from_odontogram: row.suggested_from_odontogram,
        })
    }
}

impl Database {
    /// Insert a new treatment.
    pub fn insert_treatment(&self, treatment: &Treatment) -> DbResult<()> {
        treatment.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO treatments (
                id, patient_id, doctor_id, type, description, teeth, status,
                cost, start_date, end_date, notes, suggested_from_odontogram
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                treatment.id,
                treatment.patient_id,
                treatment.doctor_id,
                treatment.treatment_type,
                treatment.description,
                serde_json::to_string(&treatment.teeth)?,
                treatment.status.as_str(),
                treatment.cost,
                treatment.start_date,
                treatment.end_date,
                treatment.notes,
                treatment.suggested_from_odontogram,
            ],
        )?;
        Ok(())
    }

    /// Update an existing treatment.
    pub fn update_treatment(&self, treatment: &Treatment) -> DbResult<bool> {
        treatment.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE treatments SET
                doctor_id = ?2,
                type = ?3,
                description = ?4,
                teeth = ?5,
                status = ?6,
                cost = ?7,
                start_date = ?8,
                end_date = ?9,
                notes = ?10
            WHERE id = ?1
            "#,
            params![
                treatment.id,
                treatment.doctor_id,
                treatment.treatment_type,
                treatment.description,
                serde_json::to_string(&treatment.teeth)?,
                treatment.status.as_str(),
                treatment.cost,
                treatment.start_date,
                treatment.end_date,
                treatment.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark a treatment completed on `end_date`.
    pub fn complete_treatment(&self, id: &str, end_date: &str) -> DbResult<Treatment> {
        let mut treatment = self
            .get_treatment(id)?
            .ok_or_else(|| DbError::not_found("treatment", id))?;
        treatment.complete(end_date.to_string());
        self.update_treatment(&treatment)?;
        info!(treatment_id = %id, "treatment completed");
        Ok(treatment)
    }

    pub fn get_treatment(&self, id: &str) -> DbResult<Option<Treatment>> {
        let sql = format!("SELECT {} FROM treatments WHERE id = ?", TREATMENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], TreatmentRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// A patient's treatments, newest start date first.
    pub fn list_treatments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Treatment>> {
        let sql = format!(
            "SELECT {} FROM treatments WHERE patient_id = ? ORDER BY start_date DESC, type",
            TREATMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([patient_id], TreatmentRow::from_row)?;

        let mut treatments = Vec::new();
        for row in rows {
            treatments.push(row?.try_into()?);
        }
        Ok(treatments)
    }

    /// Create planned treatments for every suggestion the odontogram implies.
    ///
    /// A suggestion is skipped when the patient already has an unfinished
    /// treatment of the same type on the same tooth, so saving a chart twice
    /// does not duplicate the plan. Returns the treatments actually created.
    pub fn create_suggested_treatments(
        &self,
        odontogram: &Odontogram,
        doctor_id: &str,
        start_date: &str,
    ) -> DbResult<Vec<Treatment>> {
        let open: Vec<Treatment> = self
            .list_treatments_for_patient(&odontogram.patient_id)?
            .into_iter()
            .filter(|t| t.status != TreatmentStatus::Completed)
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        let mut created = Vec::new();
        for suggestion in suggest_treatments(&odontogram.teeth) {
            let planned = open.iter().any(|t| {
                t.treatment_type == suggestion.treatment_type && t.teeth.contains(&suggestion.tooth)
            });
            if planned {
                continue;
            }
            let treatment = suggestion.into_treatment(
                odontogram.patient_id.clone(),
                doctor_id.to_string(),
                start_date.to_string(),
            );
            self.insert_treatment(&treatment)?;
            created.push(treatment);
        }
        tx.commit()?;

        info!(
            patient_id = %odontogram.patient_id,
            created = created.len(),
            "suggested treatments created"
        );
        Ok(created)
    }

    pub fn delete_treatment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM treatments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
