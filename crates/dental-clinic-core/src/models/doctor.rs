//! Doctor models.

use serde::{Deserialize, Serialize};

/// A treating doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Inactive doctors are kept for history but not offered for new appointments
    pub active: bool,
}

impl Doctor {
    /// Create a new active doctor.
    pub fn new(first_name: String, last_name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            specialization: None,
            email: None,
            phone: None,
            active: true,
        }
    }

    /// Flattened display name, same as the joined views produce.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
