//! Odontogram state model.
//!
//! A chart is a sparse map from tooth number to condition. Editing goes
//! through [`ToothChart`], which keeps the map minimal: a tooth set back to
//! healthy with no notes and no surfaces disappears from the map.

pub mod numbering;
pub mod suggestions;

pub use numbering::*;
pub use suggestions::*;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Odontogram, Surface, ToothCondition, ToothStatus};

/// Odontogram editing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdontogramError {
    #[error("Tooth {tooth} is not part of the {dentition:?} dentition")]
    UnknownTooth { tooth: u8, dentition: Dentition },
}

pub type OdontogramResult<T> = Result<T, OdontogramError>;

/// The three facets edited when a tooth is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToothEdit {
    pub tooth: u8,
    pub status: ToothStatus,
    #[serde(default)]
    pub surfaces: BTreeSet<Surface>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ToothEdit {
    pub fn status(tooth: u8, status: ToothStatus) -> Self {
        Self {
            tooth,
            status,
            surfaces: BTreeSet::new(),
            notes: None,
        }
    }

    pub fn with_surfaces(mut self, surfaces: impl IntoIterator<Item = Surface>) -> Self {
        self.surfaces = surfaces.into_iter().collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn into_condition(self) -> ToothCondition {
        ToothCondition {
            status: self.status,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            surfaces: self.surfaces,
        }
    }
}

/// Editing session over one odontogram.
#[derive(Debug, Clone)]
pub struct ToothChart {
    odontogram: Odontogram,
    dentition: Dentition,
}

impl ToothChart {
    /// Start editing with the catalog implied by the chart's pediatric flag.
    pub fn new(odontogram: Odontogram) -> Self {
        let dentition = Dentition::for_patient(odontogram.is_pediatric, None);
        Self {
            odontogram,
            dentition,
        }
    }

    /// Override the catalog for this session.
    pub fn with_dentition(mut self, dentition: Dentition) -> Self {
        self.dentition = dentition;
        self.odontogram.is_pediatric = dentition.is_pediatric();
        self
    }

    pub fn dentition(&self) -> Dentition {
        self.dentition
    }

    /// Save one tooth's edit. Returns the stored condition, or `None` when the
    /// edit cleared the tooth.
    pub fn apply(&mut self, edit: ToothEdit) -> OdontogramResult<Option<&ToothCondition>> {
        let tooth = edit.tooth;
        if !self.dentition.contains(tooth) {
            return Err(OdontogramError::UnknownTooth {
                tooth,
                dentition: self.dentition,
            });
        }

        let key = tooth.to_string();
        let condition = edit.into_condition();
        if condition.is_unannotated_healthy() {
            self.odontogram.teeth.remove(&key);
            return Ok(None);
        }
        self.odontogram.teeth.insert(key.clone(), condition);
        Ok(self.odontogram.teeth.get(&key))
    }

    /// Reset a tooth to healthy and unannotated.
    pub fn clear(&mut self, tooth: u8) {
        self.odontogram.teeth.remove(&tooth.to_string());
    }

    /// Condition of a tooth; absent teeth are implicitly healthy.
    pub fn condition(&self, tooth: u8) -> ToothCondition {
        self.odontogram
            .teeth
            .get(&tooth.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.odontogram.notes = notes.filter(|n| !n.trim().is_empty());
    }

    pub fn suggestions(&self) -> Vec<SuggestedTreatment> {
        suggest_treatments(&self.odontogram.teeth)
    }

    pub fn odontogram(&self) -> &Odontogram {
        &self.odontogram
    }

    /// Finish editing.
    pub fn into_odontogram(self) -> Odontogram {
        self.odontogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chart() -> ToothChart {
        ToothChart::new(Odontogram::new("patient-1".into(), "2025-01-10".into(), false))
    }

    #[test]
    fn test_healthy_without_annotation_removes_key() {
        let mut chart = make_chart();
        chart.apply(ToothEdit::status(14, ToothStatus::Caries)).unwrap();
        assert!(chart.odontogram().teeth.contains_key("14"));

        let stored = chart.apply(ToothEdit::status(14, ToothStatus::Healthy)).unwrap();
        assert!(stored.is_none());
        assert!(!chart.odontogram().teeth.contains_key("14"));
    }

    #[test]
    fn test_annotated_healthy_is_stored() {
        let mut chart = make_chart();
        chart
            .apply(ToothEdit::status(21, ToothStatus::Healthy).with_notes("Sensibilidad al frío"))
            .unwrap();
        chart
            .apply(ToothEdit::status(22, ToothStatus::Healthy).with_surfaces([Surface::Top]))
            .unwrap();
        assert_eq!(chart.odontogram().teeth.len(), 2);
    }

    #[test]
    fn test_blank_notes_count_as_none() {
        let mut chart = make_chart();
        chart
            .apply(ToothEdit::status(21, ToothStatus::Healthy).with_notes("   "))
            .unwrap();
        assert!(chart.odontogram().teeth.is_empty());
    }

    #[test]
    fn test_edit_replaces_previous_condition() {
        let mut chart = make_chart();
        chart
            .apply(ToothEdit::status(36, ToothStatus::Caries).with_surfaces([Surface::Center, Surface::Left]))
            .unwrap();
        chart.apply(ToothEdit::status(36, ToothStatus::Crown)).unwrap();

        let condition = chart.condition(36);
        assert_eq!(condition.status, ToothStatus::Crown);
        assert!(condition.surfaces.is_empty());
    }

    #[test]
    fn test_unknown_tooth_rejected() {
        let mut chart = make_chart();
        assert_eq!(
            chart.apply(ToothEdit::status(55, ToothStatus::Caries)),
            Err(OdontogramError::UnknownTooth {
                tooth: 55,
                dentition: Dentition::Adult
            })
        );

        let mut chart = make_chart().with_dentition(Dentition::Pediatric);
        assert!(chart.apply(ToothEdit::status(55, ToothStatus::Caries)).is_ok());
        assert!(chart.odontogram().is_pediatric);
    }

    #[test]
    fn test_absent_tooth_is_healthy() {
        let chart = make_chart();
        assert_eq!(chart.condition(11), ToothCondition::new(ToothStatus::Healthy));
    }

    #[test]
    fn test_chart_suggestions() {
        let mut chart = make_chart();
        chart.apply(ToothEdit::status(46, ToothStatus::RootCanal)).unwrap();
        chart.apply(ToothEdit::status(11, ToothStatus::Filling)).unwrap();
        let suggestions = chart.suggestions();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].treatment_type, "Tratamiento de Conducto");
    }
}
