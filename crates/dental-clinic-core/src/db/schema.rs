//! SQLite schema definition.

/// Complete database schema for the clinic.
///
/// Table and column names follow the backend row shape: snake_case columns,
/// lists and maps stored as JSON text, enums stored as their wire strings.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    specialization TEXT,
    email TEXT,
    phone TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    address TEXT,
    date_of_birth TEXT,                          -- YYYY-MM-DD
    insurance_provider TEXT,
    insurance_number TEXT,
    medical_history TEXT NOT NULL DEFAULT '',
    allergies TEXT NOT NULL DEFAULT '[]',        -- JSON array of strings
    is_pediatric INTEGER NOT NULL DEFAULT 0,
    guardian_name TEXT,
    guardian_relationship TEXT,
    guardian_phone TEXT,
    guardian_email TEXT,
    doctor_id TEXT REFERENCES doctors(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name, first_name);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    start_time TEXT NOT NULL,                    -- HH:MM
    end_time TEXT NOT NULL,                      -- HH:MM
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'confirmed', 'completed', 'cancelled', 'no-show')),
    notes TEXT,
    treatment_type TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (start_time < end_time)
);

CREATE INDEX IF NOT EXISTS idx_appointments_doctor_date ON appointments(doctor_id, date);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date, start_time);

-- Appointments with display names joined in
CREATE VIEW IF NOT EXISTS appointment_details AS
SELECT a.*,
       p.first_name || ' ' || p.last_name AS patient_name,
       d.first_name || ' ' || d.last_name AS doctor_name
FROM appointments a
JOIN patients p ON p.id = a.patient_id
JOIN doctors d ON d.id = a.doctor_id;

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    teeth TEXT NOT NULL DEFAULT '[]',            -- JSON array of tooth numbers
    status TEXT NOT NULL DEFAULT 'planned'
        CHECK (status IN ('planned', 'in-progress', 'completed')),
    cost REAL NOT NULL DEFAULT 0 CHECK (cost >= 0),
    start_date TEXT NOT NULL,
    end_date TEXT,
    notes TEXT,
    suggested_from_odontogram INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_treatments_patient ON treatments(patient_id);
CREATE INDEX IF NOT EXISTS idx_treatments_doctor_status ON treatments(doctor_id, status);

-- ============================================================================
-- Invoices
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    date TEXT NOT NULL,
    due_date TEXT NOT NULL,
    items TEXT NOT NULL DEFAULT '[]',            -- JSON array of InvoiceItem
    subtotal REAL NOT NULL DEFAULT 0,
    tax REAL NOT NULL DEFAULT 0,
    discount REAL NOT NULL DEFAULT 0,
    total REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'sent', 'paid', 'overdue', 'cancelled')),
    paid_amount REAL NOT NULL DEFAULT 0,
    paid_date TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_invoices_patient ON invoices(patient_id);
CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(status, due_date);

-- ============================================================================
-- Inventory
-- ============================================================================

CREATE TABLE IF NOT EXISTS inventory (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    unit TEXT NOT NULL,
    min_quantity INTEGER NOT NULL DEFAULT 0,
    price REAL NOT NULL DEFAULT 0,
    supplier TEXT,
    last_restocked TEXT
);

CREATE INDEX IF NOT EXISTS idx_inventory_category ON inventory(category, name);

-- ============================================================================
-- Odontograms (one per patient per date)
-- ============================================================================

CREATE TABLE IF NOT EXISTS odontograms (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    teeth TEXT NOT NULL DEFAULT '{}',            -- JSON object tooth -> condition
    notes TEXT,
    is_pediatric INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_odontograms_patient_date ON odontograms(patient_id, date);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO doctors (id, first_name, last_name) VALUES ('d1', 'Laura', 'Martín');
            INSERT INTO patients (id, first_name, last_name) VALUES ('p1', 'Ana', 'García');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
        // Idempotent
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_appointment_time_check() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO appointments (id, patient_id, doctor_id, date, start_time, end_time)
             VALUES ('a1', 'p1', 'd1', '2025-01-10', '10:00', '09:00')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO appointments (id, patient_id, doctor_id, date, start_time, end_time, status)
             VALUES ('a1', 'p1', 'd1', '2025-01-10', '09:00', '10:00', 'postponed')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_appointment_details_view_joins_names() {
        let conn = setup();
        conn.execute(
            "INSERT INTO appointments (id, patient_id, doctor_id, date, start_time, end_time)
             VALUES ('a1', 'p1', 'd1', '2025-01-10', '09:00', '10:00')",
            [],
        )
        .unwrap();

        let (patient, doctor): (String, String) = conn
            .query_row(
                "SELECT patient_name, doctor_name FROM appointment_details WHERE id = 'a1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(patient, "Ana García");
        assert_eq!(doctor, "Laura Martín");
    }

    #[test]
    fn test_one_odontogram_per_patient_and_date() {
        let conn = setup();
        conn.execute(
            "INSERT INTO odontograms (id, patient_id, date) VALUES ('o1', 'p1', '2025-01-10')",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO odontograms (id, patient_id, date) VALUES ('o2', 'p1', '2025-01-10')",
            [],
        );
        assert!(result.is_err());
    }
}
