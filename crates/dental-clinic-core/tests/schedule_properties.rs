//! Property tests for date, time and suggestion invariants.

use std::collections::BTreeMap;

use proptest::prelude::*;

use dental_clinic_core::models::{ToothCondition, ToothStatus};
use dental_clinic_core::odontogram::{suggest_treatments, treatment_for, ADULT_LOWER, ADULT_UPPER};
use dental_clinic_core::schedule::{normalize_date_str, TimeBlock, TimeOfDay};

fn any_status() -> impl Strategy<Value = ToothStatus> {
    proptest::sample::select(ToothStatus::ALL.to_vec())
}

fn any_adult_tooth() -> impl Strategy<Value = u8> {
    let teeth: Vec<u8> = ADULT_UPPER.iter().chain(ADULT_LOWER.iter()).copied().collect();
    proptest::sample::select(teeth)
}

fn any_time() -> impl Strategy<Value = TimeOfDay> {
    (0u8..24, 0u8..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
}

proptest! {
    #[test]
    fn canonical_date_is_fixed_point(year in 1950i32..2100, month in 1u32..=12, day in 1u32..=28) {
        let canonical = format!("{:04}-{:02}-{:02}", year, month, day);
        let once = normalize_date_str(&canonical).unwrap();
        prop_assert_eq!(&once, &canonical);
        prop_assert_eq!(normalize_date_str(&once).unwrap(), once);
    }

    #[test]
    fn timestamp_suffix_keeps_calendar_day(
        year in 1950i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
    ) {
        let canonical = format!("{:04}-{:02}-{:02}", year, month, day);
        let stamped = format!("{}T{:02}:30:00Z", canonical, hour);
        prop_assert_eq!(normalize_date_str(&stamped).unwrap(), canonical.clone());

        let slashed = format!("{:02}/{:02}/{:04}", day, month, year);
        prop_assert_eq!(normalize_date_str(&slashed).unwrap(), canonical);
    }

    #[test]
    fn time_text_round_trips(time in any_time()) {
        let text = time.to_string();
        prop_assert_eq!(text.len(), 5);
        prop_assert_eq!(text.parse::<TimeOfDay>().unwrap(), time);
    }

    #[test]
    fn overlap_is_symmetric(a in any_time(), b in any_time(), c in any_time(), d in any_time()) {
        if let (Ok(first), Ok(second)) = (TimeBlock::new(a, b), TimeBlock::new(c, d)) {
            prop_assert_eq!(first.overlaps(&second), second.overlaps(&first));
            prop_assert!(first.overlaps(&first));
        }
    }

    #[test]
    fn suggestions_independent_of_entry_order(
        entries in proptest::collection::vec((any_adult_tooth(), any_status()), 0..20),
    ) {
        let mut forward = BTreeMap::new();
        for (tooth, status) in &entries {
            forward.insert(tooth.to_string(), ToothCondition::new(*status));
        }
        // Replay in reverse, keeping the last write per tooth like the forward pass
        let mut reversed = BTreeMap::new();
        for (tooth, status) in entries.iter().rev() {
            reversed
                .entry(tooth.to_string())
                .or_insert_with(|| ToothCondition::new(*status));
        }

        let suggestions = suggest_treatments(&forward);
        prop_assert_eq!(&suggestions, &suggest_treatments(&reversed));
        prop_assert!(suggestions.windows(2).all(|w| w[0].tooth < w[1].tooth));

        let needing_work = forward
            .values()
            .filter(|c| treatment_for(c.status).is_some())
            .count();
        prop_assert_eq!(suggestions.len(), needing_work);
    }
}

#[test]
fn caries_and_extraction_in_either_order() {
    let mut first = BTreeMap::new();
    first.insert("14".to_string(), ToothCondition::new(ToothStatus::Caries));
    first.insert("22".to_string(), ToothCondition::new(ToothStatus::Extraction));

    let mut second = BTreeMap::new();
    second.insert("22".to_string(), ToothCondition::new(ToothStatus::Extraction));
    second.insert("14".to_string(), ToothCondition::new(ToothStatus::Caries));

    let suggestions = suggest_treatments(&first);
    assert_eq!(suggestions, suggest_treatments(&second));
    assert_eq!(suggestions[0].tooth, 14);
    assert_eq!(suggestions[0].treatment_type, "Empaste");
    assert_eq!(suggestions[1].tooth, 22);
    assert_eq!(suggestions[1].treatment_type, "Extracción");
}

#[test]
fn impossible_dates_rejected() {
    assert!(normalize_date_str("2025-02-30").is_err());
    assert!(normalize_date_str("2025-13-01").is_err());
    assert!(normalize_date_str("").is_err());
}
