//! Invoice export for accounting.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::models::{round_currency, Invoice, InvoiceStatus};
use crate::revision::fingerprint;

const CSV_HEADER: &str = "invoice_id,patient_id,patient_name,date,due_date,status,\
description,quantity,unit_price,line_total,invoice_total,revision\n";

/// Export of a single invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExport {
    /// Export metadata
    pub metadata: InvoiceMetadata,
    /// Billed lines
    pub line_items: Vec<InvoiceLineItem>,
}

/// Invoice export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    pub invoice_id: String,
    pub patient_id: String,
    /// "First Last", empty if the patient no longer exists
    pub patient_name: String,
    pub date: String,
    pub due_date: String,
    pub status: InvoiceStatus,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub paid_amount: f64,
    /// Export timestamp
    pub exported_at: String,
    /// Revision of the invoice at export time, for reconciliation
    pub revision: String,
}

/// Single billed line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

impl InvoiceExport {
    /// Create an export from an invoice and its patient's display name.
    pub fn from_invoice(invoice: &Invoice, patient_name: &str) -> Result<Self, serde_json::Error> {
        let line_items = invoice
            .items
            .iter()
            .map(|item| InvoiceLineItem {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
            })
            .collect();

        Ok(Self {
            metadata: InvoiceMetadata {
                invoice_id: invoice.id.clone(),
                patient_id: invoice.patient_id.clone(),
                patient_name: patient_name.to_string(),
                date: invoice.date.clone(),
                due_date: invoice.due_date.clone(),
                status: invoice.status,
                subtotal: invoice.subtotal,
                tax: invoice.tax,
                discount: invoice.discount,
                total: invoice.total,
                paid_amount: invoice.paid_amount,
                exported_at: chrono::Utc::now().to_rfc3339(),
                revision: fingerprint(invoice)?,
            },
            line_items,
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV, one row per line item.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.write_csv_rows(&mut csv);
        csv
    }

    fn write_csv_rows(&self, csv: &mut String) {
        let meta = &self.metadata;
        for item in &self.line_items {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{:.2},{:.2},{:.2},{}\n",
                escape_csv(&meta.invoice_id),
                escape_csv(&meta.patient_id),
                escape_csv(&meta.patient_name),
                escape_csv(&meta.date),
                escape_csv(&meta.due_date),
                meta.status,
                escape_csv(&item.description),
                item.quantity,
                item.unit_price,
                item.total,
                meta.total,
                meta.revision,
            ));
        }
    }
}

/// Batch invoice export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInvoiceExport {
    /// Export timestamp
    pub exported_at: String,
    pub invoices: Vec<InvoiceExport>,
    /// Total line item count
    pub total_items: usize,
    /// Sum of invoice totals
    pub grand_total: f64,
}

impl BatchInvoiceExport {
    fn new(invoices: Vec<InvoiceExport>) -> Self {
        let total_items = invoices.iter().map(|i| i.line_items.len()).sum();
        let grand_total = invoices.iter().map(|i| i.metadata.total).sum::<f64>();
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            invoices,
            total_items,
            grand_total: round_currency(grand_total),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for export in &self.invoices {
            export.write_csv_rows(&mut csv);
        }
        csv
    }
}

/// Invoice exporter.
pub struct InvoiceExporter<'a> {
    db: &'a Database,
}

impl<'a> InvoiceExporter<'a> {
    /// Create a new invoice exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn export(&self, invoice: &Invoice) -> DbResult<InvoiceExport> {
        let patient_name = self
            .db
            .get_patient(&invoice.patient_id)?
            .map(|p| p.full_name())
            .unwrap_or_default();
        Ok(InvoiceExport::from_invoice(invoice, &patient_name)?)
    }

    /// Export a single invoice.
    pub fn export_invoice(&self, invoice_id: &str) -> DbResult<InvoiceExport> {
        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or_else(|| DbError::not_found("invoice", invoice_id))?;
        self.export(&invoice)
    }

    /// Export every invoice.
    pub fn export_all(&self) -> DbResult<BatchInvoiceExport> {
        let exports = self
            .db
            .list_invoices()?
            .iter()
            .map(|invoice| self.export(invoice))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(BatchInvoiceExport::new(exports))
    }

    /// Export one patient's invoices.
    pub fn export_for_patient(&self, patient_id: &str) -> DbResult<BatchInvoiceExport> {
        let exports = self
            .db
            .list_invoices_for_patient(patient_id)?
            .iter()
            .map(|invoice| self.export(invoice))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(BatchInvoiceExport::new(exports))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
