//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::{info, warn};

use super::{from_json, Database, DbError, DbResult};
use crate::models::{AssignedDoctor, LegalGuardian, Patient};

/// Minimum blended similarity for a fuzzy name match.
const MATCH_THRESHOLD: f64 = 0.75;

const PATIENT_SELECT: &str = r#"
    SELECT p.id, p.first_name, p.last_name, p.email, p.phone, p.address,
           p.date_of_birth, p.insurance_provider, p.insurance_number,
           p.medical_history, p.allergies, p.is_pediatric,
           p.guardian_name, p.guardian_relationship, p.guardian_phone, p.guardian_email,
           p.doctor_id, d.first_name || ' ' || d.last_name, d.specialization,
           p.created_at, p.updated_at
    FROM patients p
    LEFT JOIN doctors d ON d.id = p.doctor_id
"#;

/// A patient returned by [`Database::search_patients`] with its score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientMatch {
    pub patient: Patient,
    /// 1.0 for a substring hit, otherwise the fuzzy name similarity
    pub score: f64,
}

struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    date_of_birth: Option<String>,
    insurance_provider: Option<String>,
    insurance_number: Option<String>,
    medical_history: String,
    allergies: String,
    is_pediatric: bool,
    guardian_name: Option<String>,
    guardian_relationship: Option<String>,
    guardian_phone: Option<String>,
    guardian_email: Option<String>,
    doctor_id: Option<String>,
    doctor_name: Option<String>,
    doctor_specialization: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            address: row.get(5)?,
            date_of_birth: row.get(6)?,
            insurance_provider: row.get(7)?,
            insurance_number: row.get(8)?,
            medical_history: row.get(9)?,
            allergies: row.get(10)?,
            is_pediatric: row.get(11)?,
            guardian_name: row.get(12)?,
            guardian_relationship: row.get(13)?,
            guardian_phone: row.get(14)?,
            guardian_email: row.get(15)?,
            doctor_id: row.get(16)?,
            doctor_name: row.get(17)?,
            doctor_specialization: row.get(18)?,
            created_at: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let legal_guardian = match (row.guardian_name, row.guardian_phone) {
            (Some(name), Some(phone)) => Some(LegalGuardian {
                name,
                relationship: row.guardian_relationship.unwrap_or_default(),
                phone,
                email: row.guardian_email,
            }),
            _ => None,
        };
        let assigned_doctor = match (row.doctor_id, row.doctor_name) {
            (Some(id), Some(name)) => Some(AssignedDoctor {
                id,
                name,
                specialization: row.doctor_specialization,
            }),
            _ => None,
        };

        Ok(Patient {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            date_of_birth: row.date_of_birth,
            insurance_provider: row.insurance_provider,
            insurance_number: row.insurance_number,
            medical_history: row.medical_history,
            allergies: from_json("allergies", &row.allergies)?,
            is_pediatric: row.is_pediatric,
            legal_guardian,
            assigned_doctor,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Blend of Jaro-Winkler and normalized Levenshtein, both on lowercase input.
fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    jaro_winkler(&a, &b) * 0.6 + normalized_levenshtein(&a, &b) * 0.4
}

fn score_patient(patient: &Patient, query: &str) -> f64 {
    let needle = query.to_lowercase();
    let full_name = patient.full_name();
    let exact_fields = [
        Some(full_name.as_str()),
        patient.email.as_deref(),
        patient.phone.as_deref(),
    ];
    if exact_fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    {
        return 1.0;
    }

    [
        name_similarity(&full_name, query),
        name_similarity(&patient.first_name, query),
        name_similarity(&patient.last_name, query),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        patient.validate()?;
        let guardian = patient.legal_guardian.as_ref();
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, first_name, last_name, email, phone, address, date_of_birth,
                insurance_provider, insurance_number, medical_history, allergies,
                is_pediatric, guardian_name, guardian_relationship, guardian_phone,
                guardian_email, doctor_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.email,
                patient.phone,
                patient.address,
                patient.date_of_birth,
                patient.insurance_provider,
                patient.insurance_number,
                patient.medical_history,
                serde_json::to_string(&patient.allergies)?,
                patient.is_pediatric,
                guardian.map(|g| g.name.as_str()),
                guardian.map(|g| g.relationship.as_str()),
                guardian.map(|g| g.phone.as_str()),
                guardian.and_then(|g| g.email.as_deref()),
                patient.assigned_doctor.as_ref().map(|d| d.id.as_str()),
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        info!(patient_id = %patient.id, pediatric = patient.is_pediatric, "patient created");
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        patient.validate()?;
        let guardian = patient.legal_guardian.as_ref();
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                date_of_birth = ?7,
                insurance_provider = ?8,
                insurance_number = ?9,
                medical_history = ?10,
                allergies = ?11,
                is_pediatric = ?12,
                guardian_name = ?13,
                guardian_relationship = ?14,
                guardian_phone = ?15,
                guardian_email = ?16,
                doctor_id = ?17,
                updated_at = ?18
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.email,
                patient.phone,
                patient.address,
                patient.date_of_birth,
                patient.insurance_provider,
                patient.insurance_number,
                patient.medical_history,
                serde_json::to_string(&patient.allergies)?,
                patient.is_pediatric,
                guardian.map(|g| g.name.as_str()),
                guardian.map(|g| g.relationship.as_str()),
                guardian.map(|g| g.phone.as_str()),
                guardian.and_then(|g| g.email.as_deref()),
                patient.assigned_doctor.as_ref().map(|d| d.id.as_str()),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID, with the assigned doctor flattened in.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!("{} WHERE p.id = ?", PATIENT_SELECT);
        self.conn
            .query_row(&sql, [id], PatientRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all patients, by last then first name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let sql = format!("{} ORDER BY p.last_name, p.first_name", PATIENT_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List the patients assigned to a doctor.
    pub fn list_patients_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<Patient>> {
        let sql = format!(
            "{} WHERE p.doctor_id = ? ORDER BY p.last_name, p.first_name",
            PATIENT_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([doctor_id], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Search patients by name, email or phone.
    ///
    /// Substring hits score 1.0; otherwise names are compared fuzzily so a
    /// typo such as "Garcai" still finds "García". Best matches first.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<PatientMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<PatientMatch> = self
            .list_patients()?
            .into_iter()
            .filter_map(|patient| {
                let score = score_patient(&patient, query);
                (score >= MATCH_THRESHOLD).then_some(PatientMatch { patient, score })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.patient.last_name.cmp(&b.patient.last_name))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    /// Delete a patient. Appointments, treatments and odontograms cascade.
    ///
    /// Invoices are financial records and never cascade: a patient with any
    /// invoice is refused with [`DbError::InUse`].
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let invoices: i64 = tx.query_row(
            "SELECT COUNT(*) FROM invoices WHERE patient_id = ?",
            [id],
            |row| row.get(0),
        )?;
        if invoices > 0 {
            warn!(patient_id = %id, invoices, "patient delete refused");
            return Err(DbError::InUse {
                entity: "patient",
                id: id.to_string(),
                dependents: "invoices",
                count: invoices as usize,
            });
        }

        let rows_affected = tx.execute("DELETE FROM patients WHERE id = ?", [id])?;
        tx.commit()?;
        if rows_affected > 0 {
            info!(patient_id = %id, "patient deleted");
        }
        Ok(rows_affected > 0)
    }
}
