//! Doctor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str =
    "id, first_name, last_name, specialization, email, phone, active";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        specialization: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        active: row.get(6)?,
    })
}

impl Database {
    /// Insert or replace a doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (id, first_name, last_name, specialization, email, phone, active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                specialization = excluded.specialization,
                email = excluded.email,
                phone = excluded.phone,
                active = excluded.active
            "#,
            params![
                doctor.id,
                doctor.first_name,
                doctor.last_name,
                doctor.specialization,
                doctor.email,
                doctor.phone,
                doctor.active,
            ],
        )?;
        Ok(())
    }

    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        let sql = format!("SELECT {} FROM doctors WHERE id = ?", DOCTOR_COLUMNS);
        self.conn
            .query_row(&sql, [id], doctor_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// List doctors by last name. Inactive doctors only when asked for.
    pub fn list_doctors_filtered(&self, include_inactive: bool) -> DbResult<Vec<Doctor>> {
        let sql = format!(
            "SELECT {} FROM doctors WHERE active = 1 OR ?1 ORDER BY last_name, first_name",
            DOCTOR_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([include_inactive], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List active doctors.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        self.list_doctors_filtered(false)
    }
}
