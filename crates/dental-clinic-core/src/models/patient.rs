//! Patient models.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Local UUID - always present, generated locally
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Canonical `YYYY-MM-DD` date
    pub date_of_birth: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    /// Free-text medical history
    pub medical_history: String,
    /// Known allergies, in the order they were recorded
    pub allergies: Vec<String>,
    /// Pediatric patients must carry a legal guardian
    pub is_pediatric: bool,
    pub legal_guardian: Option<LegalGuardian>,
    /// Treating doctor, flattened from the doctors table
    pub assigned_doctor: Option<AssignedDoctor>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Legal guardian of a pediatric patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegalGuardian {
    pub name: String,
    /// e.g. "mother", "father", "tutor"
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
}

/// The doctor a patient is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedDoctor {
    pub id: String,
    pub name: String,
    pub specialization: Option<String>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(first_name: String, last_name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email: None,
            phone: None,
            address: None,
            date_of_birth: None,
            insurance_provider: None,
            insurance_number: None,
            medical_history: String::new(),
            allergies: Vec::new(),
            is_pediatric: false,
            legal_guardian: None,
            assigned_doctor: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Display name used in lists and joined views.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check whether the patient has a recorded allergy (case-insensitive).
    pub fn is_allergic_to(&self, substance: &str) -> bool {
        let substance = substance.trim().to_lowercase();
        self.allergies
            .iter()
            .any(|a| a.trim().to_lowercase() == substance)
    }

    /// Validate required fields and the pediatric guardian rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::MissingField("firstName"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("lastName"));
        }
        if self.is_pediatric {
            let guardian = self
                .legal_guardian
                .as_ref()
                .ok_or(ValidationError::MissingField("legalGuardian"))?;
            if guardian.name.trim().is_empty() {
                return Err(ValidationError::MissingField("legalGuardian.name"));
            }
            if guardian.phone.trim().is_empty() {
                return Err(ValidationError::MissingField("legalGuardian.phone"));
            }
        }
        Ok(())
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Ana".into(), "García".into());
        assert_eq!(patient.full_name(), "Ana García");
        assert!(!patient.is_pediatric);
        assert_eq!(patient.id.len(), 36); // UUID format
    }

    #[test]
    fn test_pediatric_requires_guardian() {
        let mut patient = Patient::new("Lucía".into(), "Pérez".into());
        patient.is_pediatric = true;
        assert_eq!(
            patient.validate(),
            Err(ValidationError::MissingField("legalGuardian"))
        );

        patient.legal_guardian = Some(LegalGuardian {
            name: "Marta Pérez".into(),
            relationship: "mother".into(),
            phone: "600123123".into(),
            email: None,
        });
        assert!(patient.validate().is_ok());
    }

    #[test]
    fn test_blank_names_rejected() {
        let patient = Patient::new("  ".into(), "Pérez".into());
        assert_eq!(
            patient.validate(),
            Err(ValidationError::MissingField("firstName"))
        );
    }

    #[test]
    fn test_allergy_lookup() {
        let mut patient = Patient::new("Ana".into(), "García".into());
        patient.allergies = vec!["Penicilina".into(), "Látex".into()];
        assert!(patient.is_allergic_to("penicilina"));
        assert!(!patient.is_allergic_to("ibuprofeno"));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let patient = Patient::new("Ana".into(), "García".into());
        let json = serde_json::to_string(&patient).unwrap();
        assert!(json.contains("\"firstName\""));
        assert!(json.contains("\"isPediatric\""));
    }
}
