//! Odontogram (tooth chart) models.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Condition of a single tooth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToothStatus {
    #[default]
    Healthy,
    Caries,
    Filling,
    Crown,
    Extraction,
    Implant,
    RootCanal,
}

impl ToothStatus {
    pub const ALL: [ToothStatus; 7] = [
        ToothStatus::Healthy,
        ToothStatus::Caries,
        ToothStatus::Filling,
        ToothStatus::Crown,
        ToothStatus::Extraction,
        ToothStatus::Implant,
        ToothStatus::RootCanal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToothStatus::Healthy => "healthy",
            ToothStatus::Caries => "caries",
            ToothStatus::Filling => "filling",
            ToothStatus::Crown => "crown",
            ToothStatus::Extraction => "extraction",
            ToothStatus::Implant => "implant",
            ToothStatus::RootCanal => "root-canal",
        }
    }
}

impl fmt::Display for ToothStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToothStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToothStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::invalid("status", format!("unknown tooth status '{}'", s)))
    }
}

/// Tooth surface as drawn on the chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Top => "top",
            Surface::Bottom => "bottom",
            Surface::Left => "left",
            Surface::Right => "right",
            Surface::Center => "center",
        }
    }
}

impl FromStr for Surface {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Surface::Top),
            "bottom" => Ok(Surface::Bottom),
            "left" => Ok(Surface::Left),
            "right" => Ok(Surface::Right),
            "center" => Ok(Surface::Center),
            other => Err(ValidationError::invalid(
                "surfaces",
                format!("unknown surface '{}'", other),
            )),
        }
    }
}

/// Recorded condition of one tooth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToothCondition {
    pub status: ToothStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub surfaces: BTreeSet<Surface>,
}

impl ToothCondition {
    pub fn new(status: ToothStatus) -> Self {
        Self {
            status,
            notes: None,
            surfaces: BTreeSet::new(),
        }
    }

    /// Healthy with nothing annotated; such a tooth is stored as absence.
    pub fn is_unannotated_healthy(&self) -> bool {
        self.status == ToothStatus::Healthy
            && self.surfaces.is_empty()
            && self.notes.as_deref().map_or(true, |n| n.trim().is_empty())
    }
}

/// A patient's tooth chart on a given date.
///
/// `teeth` is sparse: a missing tooth number means "healthy, unannotated".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Odontogram {
    pub id: String,
    pub patient_id: String,
    /// Canonical date; (patient_id, date) is the natural key
    pub date: String,
    pub teeth: BTreeMap<String, ToothCondition>,
    pub notes: Option<String>,
    pub is_pediatric: bool,
}

impl Odontogram {
    /// Create an empty chart.
    pub fn new(patient_id: String, date: String, is_pediatric: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            teeth: BTreeMap::new(),
            notes: None,
            is_pediatric,
        }
    }

    /// Number of teeth with a recorded condition other than healthy.
    pub fn affected_count(&self) -> usize {
        self.teeth
            .values()
            .filter(|c| c.status != ToothStatus::Healthy)
            .count()
    }
}
