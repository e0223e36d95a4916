//! Invoice models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::round_currency;
use super::{Treatment, TreatmentStatus, ValidationError};

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Still expecting money from the patient.
    pub fn is_pending(&self) -> bool {
        matches!(self, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(ValidationError::invalid(
                "status",
                format!("unknown invoice status '{}'", other),
            )),
        }
    }
}

/// A single invoice line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// quantity × unit_price, kept in sync by [`InvoiceItem::new`] and [`Invoice::recalculate`]
    pub total: f64,
}

impl InvoiceItem {
    pub fn new(description: String, quantity: u32, unit_price: f64) -> Self {
        Self {
            description,
            quantity,
            unit_price,
            total: round_currency(quantity as f64 * unit_price),
        }
    }
}

/// A patient invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub patient_id: String,
    /// Canonical issue date
    pub date: String,
    /// Canonical due date
    pub due_date: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    /// subtotal + tax - discount
    pub total: f64,
    pub status: InvoiceStatus,
    pub paid_amount: f64,
    pub paid_date: Option<String>,
    pub notes: Option<String>,
}

impl Invoice {
    /// Create an empty draft invoice.
    pub fn new(patient_id: String, date: String, due_date: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            due_date,
            items: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            discount: 0.0,
            total: 0.0,
            status: InvoiceStatus::Draft,
            paid_amount: 0.0,
            paid_date: None,
            notes: None,
        }
    }

    /// Build a draft invoice with one line per completed treatment.
    pub fn from_treatments(
        patient_id: String,
        date: String,
        due_date: String,
        treatments: &[Treatment],
    ) -> Self {
        let mut invoice = Self::new(patient_id.clone(), date, due_date);
        for treatment in treatments
            .iter()
            .filter(|t| t.patient_id == patient_id)
            .filter(|t| t.status == TreatmentStatus::Completed)
        {
            let description = if treatment.teeth.is_empty() {
                treatment.treatment_type.clone()
            } else {
                let teeth: Vec<String> = treatment.teeth.iter().map(|t| t.to_string()).collect();
                format!("{} (pieza {})", treatment.treatment_type, teeth.join(", "))
            };
            invoice.add_item(InvoiceItem::new(description, 1, treatment.cost));
        }
        invoice
    }

    /// Append a line and recompute totals.
    pub fn add_item(&mut self, item: InvoiceItem) {
        self.items.push(item);
        self.recalculate();
    }

    /// Set tax and discount and recompute totals.
    pub fn set_adjustments(&mut self, tax: f64, discount: f64) {
        self.tax = round_currency(tax);
        self.discount = round_currency(discount);
        self.recalculate();
    }

    /// Recompute every derived amount from the item lines.
    pub fn recalculate(&mut self) {
        for item in &mut self.items {
            item.total = round_currency(item.quantity as f64 * item.unit_price);
        }
        self.subtotal = round_currency(self.items.iter().map(|i| i.total).sum());
        self.total = round_currency(self.subtotal + self.tax - self.discount);
    }

    /// Amount still owed.
    pub fn balance_due(&self) -> f64 {
        round_currency((self.total - self.paid_amount).max(0.0))
    }

    /// Register a payment. Fully paid invoices move to `paid`.
    ///
    /// Payments on paid or cancelled invoices and payments above the
    /// outstanding balance are refused.
    pub fn record_payment(&mut self, amount: f64, paid_date: String) -> Result<(), ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::invalid("paidAmount", "payment must be positive"));
        }
        match self.status {
            InvoiceStatus::Cancelled => {
                return Err(ValidationError::invalid("status", "invoice is cancelled"));
            }
            InvoiceStatus::Paid => {
                return Err(ValidationError::invalid("status", "invoice is already paid"));
            }
            _ => {}
        }
        if round_currency(amount) > self.balance_due() {
            return Err(ValidationError::invalid("paidAmount", "payment exceeds the balance due"));
        }
        self.paid_amount = round_currency(self.paid_amount + amount);
        if self.paid_amount >= self.total {
            self.status = InvoiceStatus::Paid;
            self.paid_date = Some(paid_date);
        }
        Ok(())
    }

    /// Issue a draft to the patient.
    pub fn send(&mut self) -> Result<(), ValidationError> {
        if self.status != InvoiceStatus::Draft {
            return Err(ValidationError::invalid(
                "status",
                format!("only drafts can be sent, invoice is {}", self.status),
            ));
        }
        self.status = InvoiceStatus::Sent;
        Ok(())
    }

    /// Void the invoice. Paid invoices stay as they are.
    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        match self.status {
            InvoiceStatus::Paid => Err(ValidationError::invalid("status", "invoice is already paid")),
            InvoiceStatus::Cancelled => Err(ValidationError::invalid("status", "invoice is cancelled")),
            _ => {
                self.status = InvoiceStatus::Cancelled;
                Ok(())
            }
        }
    }

    /// Take the dates, lines, adjustments and notes of `edited`.
    ///
    /// Identity, patient, status and payments are kept. Closed invoices
    /// cannot be edited and the new total may not drop below what was paid.
    pub fn apply_edit(&mut self, edited: Invoice) -> Result<(), ValidationError> {
        if matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Cancelled) {
            return Err(ValidationError::invalid(
                "status",
                format!("a {} invoice cannot be edited", self.status),
            ));
        }
        let mut updated = self.clone();
        updated.date = edited.date;
        updated.due_date = edited.due_date;
        updated.items = edited.items;
        updated.tax = edited.tax;
        updated.discount = edited.discount;
        updated.notes = edited.notes;
        updated.recalculate();
        updated.validate()?;
        if updated.total < updated.paid_amount {
            return Err(ValidationError::invalid("items", "total below the amount already paid"));
        }
        *self = updated;
        Ok(())
    }

    /// A sent invoice past its due date. `today` is a canonical date.
    pub fn is_overdue(&self, today: &str) -> bool {
        match self.status {
            InvoiceStatus::Overdue => true,
            InvoiceStatus::Sent => self.due_date.as_str() < today,
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.trim().is_empty() {
            return Err(ValidationError::MissingField("patientId"));
        }
        if self.due_date.as_str() < self.date.as_str() {
            return Err(ValidationError::invalid("dueDate", "due before the invoice date"));
        }
        if self.items.iter().any(|i| !i.unit_price.is_finite() || i.unit_price < 0.0) {
            return Err(ValidationError::invalid("items", "unit price must be non-negative"));
        }
        if self.discount > self.subtotal + self.tax {
            return Err(ValidationError::invalid("discount", "discount exceeds the amount due"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_invoice() -> Invoice {
        let mut invoice = Invoice::new("patient-1".into(), "2025-01-10".into(), "2025-02-10".into());
        invoice.add_item(InvoiceItem::new("Limpieza".into(), 2, 50.0));
        invoice.add_item(InvoiceItem::new("Radiografía".into(), 1, 30.0));
        invoice
    }

    #[test]
    fn test_invoice_totals() {
        let mut invoice = make_invoice();
        assert_eq!(invoice.items[0].total, 100.0);
        assert_eq!(invoice.subtotal, 130.0);

        invoice.set_adjustments(10.0, 5.0);
        assert_eq!(invoice.total, 135.0);
        assert!(invoice.validate().is_ok());
    }

    #[test]
    fn test_record_payment_moves_to_paid() {
        let mut invoice = make_invoice();
        invoice.status = InvoiceStatus::Sent;

        invoice.record_payment(100.0, "2025-01-15".into()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.balance_due(), 30.0);

        invoice.record_payment(30.0, "2025-01-20".into()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.paid_date.as_deref(), Some("2025-01-20"));
        assert_eq!(invoice.balance_due(), 0.0);
    }

    #[test]
    fn test_payment_rejected_when_not_positive() {
        let mut invoice = make_invoice();
        assert!(invoice.record_payment(0.0, "2025-01-15".into()).is_err());
        assert!(invoice.record_payment(-5.0, "2025-01-15".into()).is_err());
    }

    #[test]
    fn test_payment_refused_once_paid_or_above_balance() {
        let mut invoice = make_invoice();
        invoice.status = InvoiceStatus::Sent;

        let err = invoice.record_payment(130.01, "2025-01-15".into()).unwrap_err();
        assert!(err.to_string().contains("exceeds the balance"));
        assert_eq!(invoice.paid_amount, 0.0);

        invoice.record_payment(130.0, "2025-01-15".into()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        let err = invoice.record_payment(10.0, "2025-01-16".into()).unwrap_err();
        assert!(err.to_string().contains("already paid"));
        assert_eq!(invoice.paid_amount, 130.0);
        assert_eq!(invoice.paid_date.as_deref(), Some("2025-01-15"));
    }

    #[test]
    fn test_from_treatments_skips_other_patients() {
        let mut mine = Treatment::new("patient-1".into(), "d".into(), "Limpieza".into(), 60.0, "2025-01-01".into());
        mine.complete("2025-01-02".into());
        let mut theirs = Treatment::new("patient-2".into(), "d".into(), "Corona".into(), 500.0, "2025-01-01".into());
        theirs.complete("2025-01-02".into());

        let invoice = Invoice::from_treatments(
            "patient-1".into(),
            "2025-01-10".into(),
            "2025-02-10".into(),
            &[mine, theirs],
        );
        assert_eq!(invoice.patient_id, "patient-1");
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].description, "Limpieza");
        assert_eq!(invoice.total, 60.0);
    }

    #[test]
    fn test_send_and_cancel_transitions() {
        let mut invoice = make_invoice();
        invoice.send().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert!(invoice.send().is_err());

        invoice.cancel().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Cancelled);
        assert!(invoice.cancel().is_err());

        let mut paid = make_invoice();
        paid.send().unwrap();
        paid.record_payment(130.0, "2025-01-15".into()).unwrap();
        assert!(paid.cancel().is_err());
        assert_eq!(paid.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_edit_keeps_payments_and_status() {
        let mut invoice = make_invoice();
        invoice.send().unwrap();
        invoice.record_payment(50.0, "2025-01-15".into()).unwrap();
        let id = invoice.id.clone();

        let mut edited = Invoice::new("someone-else".into(), "2025-01-10".into(), "2025-03-01".into());
        edited.add_item(InvoiceItem::new("Corona".into(), 1, 400.0));
        invoice.apply_edit(edited).unwrap();

        assert_eq!(invoice.id, id);
        assert_eq!(invoice.patient_id, "patient-1");
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.due_date, "2025-03-01");
        assert_eq!(invoice.total, 400.0);
        assert_eq!(invoice.balance_due(), 350.0);

        let mut cheaper = Invoice::new("patient-1".into(), "2025-01-10".into(), "2025-03-01".into());
        cheaper.add_item(InvoiceItem::new("Revisión".into(), 1, 20.0));
        assert!(invoice.apply_edit(cheaper).is_err());
        assert_eq!(invoice.total, 400.0);
    }

    #[test]
    fn test_overdue_detection() {
        let mut invoice = make_invoice();
        assert!(!invoice.is_overdue("2025-03-01")); // drafts are never overdue

        invoice.status = InvoiceStatus::Sent;
        assert!(!invoice.is_overdue("2025-02-10"));
        assert!(invoice.is_overdue("2025-02-11"));
    }

    #[test]
    fn test_from_treatments_only_bills_completed() {
        let mut done = Treatment::new("patient-1".into(), "d".into(), "Empaste".into(), 100.0, "2025-01-01".into());
        done.teeth = vec![14];
        done.complete("2025-01-02".into());
        let planned = Treatment::new("patient-1".into(), "d".into(), "Corona".into(), 500.0, "2025-01-01".into());

        let invoice = Invoice::from_treatments(
            "patient-1".into(),
            "2025-01-10".into(),
            "2025-02-10".into(),
            &[done, planned],
        );
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].description, "Empaste (pieza 14)");
        assert_eq!(invoice.total, 100.0);
    }
}
