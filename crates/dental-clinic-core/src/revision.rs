//! Record revision tokens.
//!
//! A revision is the hex SHA-256 of a record's JSON form. A caller that read
//! a record can send the revision back with a patch; if the stored record has
//! changed since, the patch is refused instead of silently clobbering it.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Revision token of any serializable record.
pub fn fingerprint<T: Serialize>(record: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(record)?;
    Ok(hex::encode(Sha256::digest(&json)))
}

/// Whether `record` still matches `expected`. No expectation always matches.
pub fn matches_revision<T: Serialize>(
    record: &T,
    expected: Option<&str>,
) -> Result<bool, serde_json::Error> {
    match expected {
        Some(expected) => Ok(fingerprint(record)? == expected),
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryItem;

    #[test]
    fn test_fingerprint_is_stable_and_hex() {
        let item = InventoryItem::new("Anestesia".into(), "Fármacos".into(), "vial".into());
        let a = fingerprint(&item).unwrap();
        let b = fingerprint(&item).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let mut item = InventoryItem::new("Anestesia".into(), "Fármacos".into(), "vial".into());
        let before = fingerprint(&item).unwrap();
        item.quantity = 4;
        assert_ne!(fingerprint(&item).unwrap(), before);
        assert!(!matches_revision(&item, Some(&before)).unwrap());
        assert!(matches_revision(&item, None).unwrap());
    }
}
