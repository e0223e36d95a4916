//! Invoice database operations.

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{from_json, Database, DbError, DbResult};
use crate::models::{Invoice, InvoiceStatus, ValidationError};

const INVOICE_COLUMNS: &str = "id, patient_id, date, due_date, items, subtotal, tax, discount, \
     total, status, paid_amount, paid_date, notes";

struct InvoiceRow {
    id: String,
    patient_id: String,
    date: String,
    due_date: String,
    items: String,
    subtotal: f64,
    tax: f64,
    discount: f64,
    total: f64,
    status: String,
    paid_amount: f64,
    paid_date: Option<String>,
    notes: Option<String>,
}

impl InvoiceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            due_date: row.get(3)?,
            items: row.get(4)?,
            subtotal: row.get(5)?,
            tax: row.get(6)?,
            discount: row.get(7)?,
            total: row.get(8)?,
            status: row.get(9)?,
            paid_amount: row.get(10)?,
            paid_date: row.get(11)?,
            notes: row.get(12)?,
        })
    }
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            due_date: row.due_date,
            items: from_json("items", &row.items)?,
            subtotal: row.subtotal,
            tax: row.tax,
            discount: row.discount,
            total: row.total,
            status: row.status.parse()?,
            paid_amount: row.paid_amount,
            paid_date: row.paid_date,
            notes: row.notes,
        })
    }
}

impl Database {
    fn query_invoices<P: rusqlite::Params>(&self, filter: &str, params: P) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices {} ORDER BY date DESC, id",
            INVOICE_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, InvoiceRow::from_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }

    /// Insert a new invoice. Totals are recomputed from the items first.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<Invoice> {
        let mut invoice = invoice.clone();
        invoice.recalculate();
        invoice.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                id, patient_id, date, due_date, items, subtotal, tax, discount,
                total, status, paid_amount, paid_date, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                invoice.id,
                invoice.patient_id,
                invoice.date,
                invoice.due_date,
                serde_json::to_string(&invoice.items)?,
                invoice.subtotal,
                invoice.tax,
                invoice.discount,
                invoice.total,
                invoice.status.as_str(),
                invoice.paid_amount,
                invoice.paid_date,
                invoice.notes,
            ],
        )?;
        info!(invoice_id = %invoice.id, total = invoice.total, "invoice created");
        Ok(invoice)
    }

    /// Update an existing invoice. Totals are recomputed from the items first.
    pub fn update_invoice(&self, invoice: &Invoice) -> DbResult<bool> {
        let mut invoice = invoice.clone();
        invoice.recalculate();
        invoice.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET
                date = ?2,
                due_date = ?3,
                items = ?4,
                subtotal = ?5,
                tax = ?6,
                discount = ?7,
                total = ?8,
                status = ?9,
                paid_amount = ?10,
                paid_date = ?11,
                notes = ?12
            WHERE id = ?1
            "#,
            params![
                invoice.id,
                invoice.date,
                invoice.due_date,
                serde_json::to_string(&invoice.items)?,
                invoice.subtotal,
                invoice.tax,
                invoice.discount,
                invoice.total,
                invoice.status.as_str(),
                invoice.paid_amount,
                invoice.paid_date,
                invoice.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Load an invoice, apply `change` and write it back in one transaction.
    fn change_invoice<F>(&self, id: &str, change: F) -> DbResult<Invoice>
    where
        F: FnOnce(&mut Invoice) -> Result<(), ValidationError>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut invoice = self
            .get_invoice(id)?
            .ok_or_else(|| DbError::not_found("invoice", id))?;
        change(&mut invoice)?;
        self.update_invoice(&invoice)?;
        tx.commit()?;
        Ok(invoice)
    }

    /// Register a payment against an invoice.
    pub fn record_invoice_payment(&self, id: &str, amount: f64, paid_date: &str) -> DbResult<Invoice> {
        let invoice = self.change_invoice(id, |invoice| {
            invoice.record_payment(amount, paid_date.to_string())
        })?;
        info!(
            invoice_id = %id,
            amount,
            status = %invoice.status,
            "payment recorded"
        );
        Ok(invoice)
    }

    /// Move a draft invoice to sent.
    pub fn send_invoice(&self, id: &str) -> DbResult<Invoice> {
        let invoice = self.change_invoice(id, Invoice::send)?;
        info!(invoice_id = %id, "invoice sent");
        Ok(invoice)
    }

    /// Cancel an unpaid invoice.
    pub fn cancel_invoice(&self, id: &str) -> DbResult<Invoice> {
        let invoice = self.change_invoice(id, Invoice::cancel)?;
        info!(invoice_id = %id, "invoice cancelled");
        Ok(invoice)
    }

    /// Replace the lines, dates and adjustments of an open invoice.
    pub fn revise_invoice(&self, id: &str, edited: Invoice) -> DbResult<Invoice> {
        let invoice = self.change_invoice(id, |invoice| invoice.apply_edit(edited))?;
        info!(invoice_id = %id, total = invoice.total, "invoice revised");
        Ok(invoice)
    }

    /// Move every sent invoice whose due date is before `today` to overdue.
    pub fn mark_overdue_invoices(&self, today: &str) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            "UPDATE invoices SET status = ?1 WHERE status = ?2 AND due_date < ?3",
            params![
                InvoiceStatus::Overdue.as_str(),
                InvoiceStatus::Sent.as_str(),
                today
            ],
        )?;
        if rows_affected > 0 {
            info!(count = rows_affected, "invoices marked overdue");
        }
        Ok(rows_affected)
    }

    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS);
        self.conn
            .query_row(&sql, [id], InvoiceRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All invoices, newest first.
    pub fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        self.query_invoices("", [])
    }

    pub fn list_invoices_for_patient(&self, patient_id: &str) -> DbResult<Vec<Invoice>> {
        self.query_invoices("WHERE patient_id = ?1", [patient_id])
    }

    pub fn list_invoices_by_status(&self, status: InvoiceStatus) -> DbResult<Vec<Invoice>> {
        self.query_invoices("WHERE status = ?1", [status.as_str()])
    }

    pub fn delete_invoice(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM invoices WHERE id = ?", [id])?;
        if rows_affected > 0 {
            info!(invoice_id = %id, "invoice deleted");
        }
        Ok(rows_affected > 0)
    }
}
