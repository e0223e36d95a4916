//! Treatment suggestions derived from a tooth condition map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numbering::parse_tooth_key;
use crate::models::{ToothCondition, ToothStatus, Treatment};

/// A treatment the chart implies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTreatment {
    pub tooth: u8,
    #[serde(rename = "type")]
    pub treatment_type: String,
    /// Base cost before any clinic-specific adjustment
    pub cost: f64,
}

/// Treatment label and base cost for a condition that needs work.
///
/// Healthy and already-filled teeth need nothing.
pub fn treatment_for(status: ToothStatus) -> Option<(&'static str, f64)> {
    match status {
        ToothStatus::Caries => Some(("Empaste", 100.0)),
        ToothStatus::Extraction => Some(("Extracción", 120.0)),
        ToothStatus::RootCanal => Some(("Tratamiento de Conducto", 600.0)),
        ToothStatus::Crown => Some(("Corona", 500.0)),
        ToothStatus::Implant => Some(("Implante", 1200.0)),
        ToothStatus::Healthy | ToothStatus::Filling => None,
    }
}

/// Suggestions for every tooth that needs work, ordered by tooth number.
///
/// Pure: the same map always yields the same list. Keys that are not tooth
/// numbers are skipped.
pub fn suggest_treatments(teeth: &BTreeMap<String, ToothCondition>) -> Vec<SuggestedTreatment> {
    let mut suggestions: Vec<SuggestedTreatment> = teeth
        .iter()
        .filter_map(|(key, condition)| {
            let tooth = parse_tooth_key(key)?;
            let (label, cost) = treatment_for(condition.status)?;
            Some(SuggestedTreatment {
                tooth,
                treatment_type: label.to_string(),
                cost,
            })
        })
        .collect();
    // Map keys sort as strings; order numerically instead
    suggestions.sort_by_key(|s| s.tooth);
    suggestions
}

/// Sum of the suggested base costs.
pub fn estimated_cost(suggestions: &[SuggestedTreatment]) -> f64 {
    suggestions.iter().map(|s| s.cost).sum()
}

impl SuggestedTreatment {
    /// Turn the suggestion into a planned treatment flagged as suggested.
    pub fn into_treatment(self, patient_id: String, doctor_id: String, start_date: String) -> Treatment {
        let mut treatment = Treatment::new(
            patient_id,
            doctor_id,
            self.treatment_type.clone(),
            self.cost,
            start_date,
        );
        treatment.description = format!("{} - pieza {}", self.treatment_type, self.tooth);
        treatment.teeth = vec![self.tooth];
        treatment.suggested_from_odontogram = true;
        treatment
    }
}
