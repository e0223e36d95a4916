//! Odontogram database operations.
//!
//! A patient has at most one chart per date; saving again on the same date
//! replaces that chart's contents and keeps its id.

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{from_json, Database, DbError, DbResult};
use crate::models::{Odontogram, ValidationError};
use crate::odontogram::{parse_tooth_key, Dentition};
use crate::schedule::normalize_date_str;

const ODONTOGRAM_COLUMNS: &str = "id, patient_id, date, teeth, notes, is_pediatric";

struct OdontogramRow {
    id: String,
    patient_id: String,
    date: String,
    teeth: String,
    notes: Option<String>,
    is_pediatric: bool,
}

impl OdontogramRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            teeth: row.get(3)?,
            notes: row.get(4)?,
            is_pediatric: row.get(5)?,
        })
    }
}

impl TryFrom<OdontogramRow> for Odontogram {
    type Error = DbError;

    fn try_from(row: OdontogramRow) -> Result<Self, Self::Error> {
        Ok(Odontogram {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            teeth: from_json("teeth", &row.teeth)?,
            notes: row.notes,
            is_pediatric: row.is_pediatric,
        })
    }
}

/// Every key must be a tooth of the chart's own dentition.
fn validate_teeth(odontogram: &Odontogram) -> Result<(), ValidationError> {
    let dentition = Dentition::for_patient(odontogram.is_pediatric, None);
    for key in odontogram.teeth.keys() {
        match parse_tooth_key(key) {
            Some(tooth) if dentition.contains(tooth) => {}
            _ => {
                return Err(ValidationError::invalid(
                    "teeth",
                    format!("'{}' is not a tooth of the {:?} dentition", key, dentition),
                ))
            }
        }
    }
    Ok(())
}

impl Database {
    /// Save a chart, replacing any chart of the same patient on the same date.
    ///
    /// Returns the stored chart, whose id is the existing row's id when the
    /// save replaced one.
    pub fn upsert_odontogram(&self, odontogram: &Odontogram) -> DbResult<Odontogram> {
        if normalize_date_str(&odontogram.date)? != odontogram.date {
            return Err(ValidationError::invalid("date", "must be a canonical YYYY-MM-DD date").into());
        }
        validate_teeth(odontogram)?;

        self.conn.execute(
            r#"
            INSERT INTO odontograms (id, patient_id, date, teeth, notes, is_pediatric, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
            ON CONFLICT(patient_id, date) DO UPDATE SET
                teeth = excluded.teeth,
                notes = excluded.notes,
                is_pediatric = excluded.is_pediatric,
                updated_at = datetime('now')
            "#,
            params![
                odontogram.id,
                odontogram.patient_id,
                odontogram.date,
                serde_json::to_string(&odontogram.teeth)?,
                odontogram.notes,
                odontogram.is_pediatric,
            ],
        )?;

        let stored = self
            .get_odontogram(&odontogram.patient_id, &odontogram.date)?
            .ok_or_else(|| DbError::not_found("odontogram", &odontogram.id))?;
        info!(
            patient_id = %stored.patient_id,
            date = %stored.date,
            affected = stored.affected_count(),
            "odontogram saved"
        );
        Ok(stored)
    }

    /// The chart of a patient on a specific date.
    pub fn get_odontogram(&self, patient_id: &str, date: &str) -> DbResult<Option<Odontogram>> {
        let sql = format!(
            "SELECT {} FROM odontograms WHERE patient_id = ?1 AND date = ?2",
            ODONTOGRAM_COLUMNS
        );
        self.conn
            .query_row(&sql, params![patient_id, date], OdontogramRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// The most recent chart of a patient.
    pub fn get_latest_odontogram(&self, patient_id: &str) -> DbResult<Option<Odontogram>> {
        let sql = format!(
            "SELECT {} FROM odontograms WHERE patient_id = ? ORDER BY date DESC LIMIT 1",
            ODONTOGRAM_COLUMNS
        );
        self.conn
            .query_row(&sql, [patient_id], OdontogramRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Every chart of a patient, newest first.
    pub fn list_odontograms_for_patient(&self, patient_id: &str) -> DbResult<Vec<Odontogram>> {
        let sql = format!(
            "SELECT {} FROM odontograms WHERE patient_id = ? ORDER BY date DESC",
            ODONTOGRAM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([patient_id], OdontogramRow::from_row)?;

        let mut charts = Vec::new();
        for row in rows {
            charts.push(row?.try_into()?);
        }
        Ok(charts)
    }
}
