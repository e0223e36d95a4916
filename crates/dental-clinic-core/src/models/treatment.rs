//! Treatment plan models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::round_currency;
use super::ValidationError;

/// Treatment progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TreatmentStatus {
    Planned,
    InProgress,
    Completed,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Planned => "planned",
            TreatmentStatus::InProgress => "in-progress",
            TreatmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TreatmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(TreatmentStatus::Planned),
            "in-progress" => Ok(TreatmentStatus::InProgress),
            "completed" => Ok(TreatmentStatus::Completed),
            other => Err(ValidationError::invalid(
                "status",
                format!("unknown treatment status '{}'", other),
            )),
        }
    }
}

/// A treatment in a patient's plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// Free-text category (e.g. "Empaste", "Corona")
    #[serde(rename = "type")]
    pub treatment_type: String,
    pub description: String,
    /// Affected tooth numbers (FDI)
    pub teeth: Vec<u8>,
    pub status: TreatmentStatus,
    /// Currency amount, rounded to cents
    pub cost: f64,
    /// Canonical start date
    pub start_date: String,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    /// Created from an odontogram suggestion rather than by hand
    pub suggested_from_odontogram: bool,
}

impl Treatment {
    /// Create a planned treatment.
    pub fn new(
        patient_id: String,
        doctor_id: String,
        treatment_type: String,
        cost: f64,
        start_date: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            description: treatment_type.clone(),
            treatment_type,
            teeth: Vec::new(),
            status: TreatmentStatus::Planned,
            cost: round_currency(cost),
            start_date,
            end_date: None,
            notes: None,
            suggested_from_odontogram: false,
        }
    }

    /// Mark completed on the given canonical date.
    pub fn complete(&mut self, end_date: String) {
        self.status = TreatmentStatus::Completed;
        self.end_date = Some(end_date);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.trim().is_empty() {
            return Err(ValidationError::MissingField("patientId"));
        }
        if self.doctor_id.trim().is_empty() {
            return Err(ValidationError::MissingField("doctorId"));
        }
        if self.treatment_type.trim().is_empty() {
            return Err(ValidationError::MissingField("type"));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(ValidationError::invalid("cost", "must be a non-negative amount"));
        }
        if let Some(end) = &self.end_date {
            if end.as_str() < self.start_date.as_str() {
                return Err(ValidationError::invalid("endDate", "ends before it starts"));
            }
        }
        Ok(())
    }
}
