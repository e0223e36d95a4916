//! FDI tooth numbering catalogs.

use serde::{Deserialize, Serialize};

/// Permanent teeth, upper arch, drawn from the patient's right to left.
pub const ADULT_UPPER: [u8; 16] = [18, 17, 16, 15, 14, 13, 12, 11, 21, 22, 23, 24, 25, 26, 27, 28];
/// Permanent teeth, lower arch.
pub const ADULT_LOWER: [u8; 16] = [48, 47, 46, 45, 44, 43, 42, 41, 31, 32, 33, 34, 35, 36, 37, 38];
/// Primary teeth, upper arch.
pub const PEDIATRIC_UPPER: [u8; 10] = [55, 54, 53, 52, 51, 61, 62, 63, 64, 65];
/// Primary teeth, lower arch.
pub const PEDIATRIC_LOWER: [u8; 10] = [85, 84, 83, 82, 81, 71, 72, 73, 74, 75];

/// Which catalog a chart is edited against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dentition {
    Adult,
    Pediatric,
}

impl Dentition {
    /// Catalog for a patient, unless the editing session overrides it.
    pub fn for_patient(is_pediatric: bool, session_override: Option<Dentition>) -> Self {
        session_override.unwrap_or(if is_pediatric {
            Dentition::Pediatric
        } else {
            Dentition::Adult
        })
    }

    pub fn upper(&self) -> &'static [u8] {
        match self {
            Dentition::Adult => &ADULT_UPPER,
            Dentition::Pediatric => &PEDIATRIC_UPPER,
        }
    }

    pub fn lower(&self) -> &'static [u8] {
        match self {
            Dentition::Adult => &ADULT_LOWER,
            Dentition::Pediatric => &PEDIATRIC_LOWER,
        }
    }

    /// Every tooth, upper arch first.
    pub fn teeth(&self) -> impl Iterator<Item = u8> + '_ {
        self.upper().iter().chain(self.lower()).copied()
    }

    pub fn contains(&self, tooth: u8) -> bool {
        self.upper().contains(&tooth) || self.lower().contains(&tooth)
    }

    pub fn is_pediatric(&self) -> bool {
        matches!(self, Dentition::Pediatric)
    }
}

/// Parse a tooth-map key back into a tooth number.
pub fn parse_tooth_key(key: &str) -> Option<u8> {
    key.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(Dentition::Adult.teeth().count(), 32);
        assert_eq!(Dentition::Pediatric.teeth().count(), 20);
    }

    #[test]
    fn test_catalogs_are_disjoint() {
        assert!(Dentition::Adult
            .teeth()
            .all(|tooth| !Dentition::Pediatric.contains(tooth)));
    }

    #[test]
    fn test_selection_and_override() {
        assert_eq!(Dentition::for_patient(true, None), Dentition::Pediatric);
        assert_eq!(Dentition::for_patient(false, None), Dentition::Adult);
        assert_eq!(
            Dentition::for_patient(true, Some(Dentition::Adult)),
            Dentition::Adult
        );
    }

    #[test]
    fn test_parse_tooth_key() {
        assert_eq!(parse_tooth_key("14"), Some(14));
        assert_eq!(parse_tooth_key("x"), None);
    }
}
