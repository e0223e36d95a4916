//! Aggregate views for the dashboard and monthly reports.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{round_currency, AppointmentStatus, InvoiceStatus, TreatmentStatus};
use crate::schedule::{ScheduleError, ScheduleResult};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_patients: u32,
    /// Today's appointments that are not cancelled
    pub appointments_today: u32,
    /// Scheduled or confirmed appointments after today
    pub appointments_upcoming: u32,
    /// Sent or overdue invoices
    pub pending_invoices: u32,
    /// Invoices paid in the current month
    pub revenue_this_month: f64,
    pub low_stock_items: u32,
}

/// Revenue a doctor generated in a month from completed treatments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRevenue {
    pub doctor_id: String,
    pub doctor_name: String,
    pub revenue: f64,
    pub completed_treatments: u32,
}

/// Number of appointments in one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: u32,
}

/// `YYYY-MM` prefix for a month, rejecting impossible months.
fn month_prefix(year: i32, month: u32) -> ScheduleResult<String> {
    if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
        return Err(ScheduleError::InvalidDate(format!("{}-{}", year, month)));
    }
    Ok(format!("{:04}-{:02}", year, month))
}

/// Report builder.
pub struct ReportBuilder<'a> {
    db: &'a Database,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<u32> {
        Ok(self.db.conn().query_row(sql, params, |row| row.get(0))?)
    }

    /// Dashboard summary relative to `today` (canonical date).
    pub fn dashboard_summary(&self, today: &str) -> DbResult<DashboardSummary> {
        let month = today.get(..7).unwrap_or(today);

        let total_patients = self.count("SELECT COUNT(*) FROM patients", [])?;
        let appointments_today = self.count(
            "SELECT COUNT(*) FROM appointments WHERE date = ?1 AND status != ?2",
            params![today, AppointmentStatus::Cancelled.as_str()],
        )?;
        let appointments_upcoming = self.count(
            "SELECT COUNT(*) FROM appointments WHERE date > ?1 AND status IN (?2, ?3)",
            params![
                today,
                AppointmentStatus::Scheduled.as_str(),
                AppointmentStatus::Confirmed.as_str()
            ],
        )?;
        let pending_invoices = self.count(
            "SELECT COUNT(*) FROM invoices WHERE status IN (?1, ?2)",
            params![InvoiceStatus::Sent.as_str(), InvoiceStatus::Overdue.as_str()],
        )?;
        let low_stock_items =
            self.count("SELECT COUNT(*) FROM inventory WHERE quantity < min_quantity", [])?;
        let revenue: f64 = self.db.conn().query_row(
            "SELECT COALESCE(SUM(total), 0) FROM invoices
             WHERE status = ?1 AND substr(paid_date, 1, 7) = ?2",
            params![InvoiceStatus::Paid.as_str(), month],
            |row| row.get(0),
        )?;

        Ok(DashboardSummary {
            total_patients,
            appointments_today,
            appointments_upcoming,
            pending_invoices,
            revenue_this_month: round_currency(revenue),
            low_stock_items,
        })
    }

    /// Completed-treatment revenue per doctor for a month, highest first.
    pub fn monthly_revenue_by_doctor(&self, year: i32, month: u32) -> DbResult<Vec<DoctorRevenue>> {
        let prefix = month_prefix(year, month)?;
        let mut stmt = self.db.conn().prepare(
            r#"
            SELECT t.doctor_id, d.first_name || ' ' || d.last_name, SUM(t.cost), COUNT(*)
            FROM treatments t
            JOIN doctors d ON d.id = t.doctor_id
            WHERE t.status = ?1 AND substr(t.end_date, 1, 7) = ?2
            GROUP BY t.doctor_id
            ORDER BY SUM(t.cost) DESC, d.last_name
            "#,
        )?;
        let rows = stmt.query_map(
            params![TreatmentStatus::Completed.as_str(), prefix],
            |row| {
                let revenue: f64 = row.get(2)?;
                Ok(DoctorRevenue {
                    doctor_id: row.get(0)?,
                    doctor_name: row.get(1)?,
                    revenue: round_currency(revenue),
                    completed_treatments: row.get(3)?,
                })
            },
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Appointment counts per status between two dates (inclusive).
    ///
    /// Every status is listed, zero counts included.
    pub fn appointment_status_breakdown(&self, from: &str, to: &str) -> DbResult<Vec<StatusCount>> {
        let mut breakdown = Vec::with_capacity(AppointmentStatus::ALL.len());
        for status in AppointmentStatus::ALL {
            let count = self.count(
                "SELECT COUNT(*) FROM appointments WHERE status = ?1 AND date BETWEEN ?2 AND ?3",
                params![status.as_str(), from, to],
            )?;
            breakdown.push(StatusCount { status, count });
        }
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{
        Appointment, Doctor, InventoryItem, Invoice, InvoiceItem, NewAppointment, Patient,
        Treatment,
    };

    struct Fixture {
        db: Database,
        patient: Patient,
        laura: Doctor,
        pedro: Doctor,
    }

    fn setup_db() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Ana".into(), "García".into());
        let laura = Doctor::new("Laura".into(), "Martín".into());
        let pedro = Doctor::new("Pedro".into(), "Alonso".into());
        db.insert_patient(&patient).unwrap();
        db.insert_doctor(&laura).unwrap();
        db.insert_doctor(&pedro).unwrap();
        Fixture {
            db,
            patient,
            laura,
            pedro,
        }
    }

    fn book(fx: &Fixture, date: &str, start: &str, end: &str) -> Appointment {
        let appointment = Appointment::from_form(&NewAppointment {
            patient_id: fx.patient.id.clone(),
            doctor_id: fx.laura.id.clone(),
            date: date.into(),
            start_time: start.into(),
            end_time: end.into(),
            ..Default::default()
        });
        fx.db.insert_appointment(&appointment).unwrap();
        appointment
    }

    fn completed(fx: &Fixture, doctor: &Doctor, cost: f64, end_date: &str) {
        let mut treatment = Treatment::new(
            fx.patient.id.clone(),
            doctor.id.clone(),
            "Empaste".into(),
            cost,
            "2025-01-01".into(),
        );
        treatment.complete(end_date.into());
        fx.db.insert_treatment(&treatment).unwrap();
    }

    #[test]
    fn test_dashboard_summary() {
        let fx = setup_db();
        book(&fx, "2025-01-10", "09:00", "10:00");
        let cancelled = book(&fx, "2025-01-10", "11:00", "12:00");
        fx.db
            .set_appointment_status(&cancelled.id, AppointmentStatus::Cancelled)
            .unwrap();
        book(&fx, "2025-01-11", "09:00", "10:00");

        let mut paid = Invoice::new(fx.patient.id.clone(), "2025-01-02".into(), "2025-01-30".into());
        paid.add_item(InvoiceItem::new("Limpieza".into(), 1, 60.0));
        paid.status = InvoiceStatus::Sent;
        paid.record_payment(60.0, "2025-01-05".into()).unwrap();
        fx.db.insert_invoice(&paid).unwrap();

        let mut sent = Invoice::new(fx.patient.id.clone(), "2025-01-02".into(), "2025-01-30".into());
        sent.add_item(InvoiceItem::new("Corona".into(), 1, 500.0));
        sent.status = InvoiceStatus::Sent;
        fx.db.insert_invoice(&sent).unwrap();

        let mut gloves = InventoryItem::new("Guantes".into(), "Material".into(), "caja".into());
        gloves.quantity = 3;
        gloves.min_quantity = 10;
        fx.db.insert_inventory_item(&gloves).unwrap();

        let summary = ReportBuilder::new(&fx.db)
            .dashboard_summary("2025-01-10")
            .unwrap();
        assert_eq!(
            summary,
            DashboardSummary {
                total_patients: 1,
                appointments_today: 1,
                appointments_upcoming: 1,
                pending_invoices: 1,
                revenue_this_month: 60.0,
                low_stock_items: 1,
            }
        );
    }

    #[test]
    fn test_monthly_revenue_by_doctor() {
        let fx = setup_db();
        completed(&fx, &fx.laura, 100.0, "2025-01-05");
        completed(&fx, &fx.laura, 600.0, "2025-01-20");
        completed(&fx, &fx.pedro, 120.0, "2025-01-09");
        completed(&fx, &fx.pedro, 500.0, "2025-02-01");

        let revenue = ReportBuilder::new(&fx.db)
            .monthly_revenue_by_doctor(2025, 1)
            .unwrap();
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue[0].doctor_name, "Laura Martín");
        assert_eq!(revenue[0].revenue, 700.0);
        assert_eq!(revenue[0].completed_treatments, 2);
        assert_eq!(revenue[1].revenue, 120.0);

        assert!(matches!(
            ReportBuilder::new(&fx.db).monthly_revenue_by_doctor(2025, 13),
            Err(DbError::Schedule(ScheduleError::InvalidDate(_)))
        ));
    }

    #[test]
    fn test_revenue_rounded_to_cents() {
        let fx = setup_db();
        completed(&fx, &fx.pedro, 0.1, "2025-01-05");
        completed(&fx, &fx.pedro, 0.2, "2025-01-06");

        let revenue = ReportBuilder::new(&fx.db)
            .monthly_revenue_by_doctor(2025, 1)
            .unwrap();
        assert_eq!(revenue[0].revenue, 0.3);
    }

    #[test]
    fn test_status_breakdown_lists_every_status() {
        let fx = setup_db();
        let first = book(&fx, "2025-01-10", "09:00", "10:00");
        book(&fx, "2025-01-10", "10:00", "11:00");
        book(&fx, "2025-03-01", "09:00", "10:00");
        fx.db
            .set_appointment_status(&first.id, AppointmentStatus::Completed)
            .unwrap();

        let breakdown = ReportBuilder::new(&fx.db)
            .appointment_status_breakdown("2025-01-01", "2025-01-31")
            .unwrap();
        assert_eq!(breakdown.len(), AppointmentStatus::ALL.len());
        assert_eq!(breakdown[0].status, AppointmentStatus::Scheduled);
        assert_eq!(breakdown[0].count, 1);
        assert_eq!(breakdown[2].status, AppointmentStatus::Completed);
        assert_eq!(breakdown[2].count, 1);
        assert_eq!(breakdown[4].count, 0);
    }
}
