//! Recommendation engine
//!
//! Combines band classification with the protocol table lookup. A
//! recommendation is only produced once both a trend arrow and a usable
//! reading are present; there is no partial result.

use serde::Serialize;

use crate::bands::{classify, Band};
use crate::carbs::CarbValue;
use crate::protocol::ProtocolTable;
use crate::trend::TrendDirection;
use crate::units::MgDl;
use crate::urgency::UrgencyTier;

/// What to do for one (trend, reading) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub trend: TrendDirection,
    pub reading: MgDl,
    pub band_index: usize,
    pub band: Band,
    pub carb_amount: CarbValue,
    pub finger_poke: bool,
    pub retest: bool,
    pub urgency: UrgencyTier,
}

/// Headline plus follow-up line shown with a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionText {
    pub main: String,
    pub sub: String,
}

/// Look up the protocol action for a trend and reading.
///
/// Returns `None` when either input is missing.
pub fn recommend(
    trend: Option<TrendDirection>,
    reading: Option<MgDl>,
    table: &ProtocolTable,
) -> Option<Recommendation> {
    let (trend, reading) = (trend?, reading?);
    let band_index = classify(reading, table.bands());
    let cell = table.cell(trend, band_index)?;

    Some(Recommendation {
        trend,
        reading,
        band_index,
        band: table.bands()[band_index].clone(),
        carb_amount: cell.carbs,
        finger_poke: cell.finger_poke,
        retest: cell.retest,
        urgency: UrgencyTier::classify(cell.carbs, trend, band_index),
    })
}

/// Same as [`recommend`], taking the reading as typed
pub fn recommend_input(
    trend: Option<TrendDirection>,
    reading: &str,
    table: &ProtocolTable,
) -> Option<Recommendation> {
    recommend(trend, MgDl::parse(reading), table)
}

impl Recommendation {
    pub fn action(&self) -> ActionText {
        let (main, sub) = match self.carb_amount {
            CarbValue::None => ("No Action".to_string(), "Blood sugar is in acceptable range".to_string()),
            CarbValue::CheckPump => ("Check Insulin Pump".to_string(), "High correction may be needed".to_string()),
            CarbValue::Observe => ("Observe & Recheck".to_string(), "Monitor for ~15 minutes".to_string()),
            CarbValue::Grams(grams) => {
                let poke = if self.finger_poke { "Do a finger poke · " } else { "" };
                let check = if self.retest { "Retest" } else { "Recheck" };
                (format!("Take {}g Carbs", grams), format!("{}{} ~15 min", poke, check))
            }
        };
        ActionText { main, sub }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_give_nothing() {
        let table = ProtocolTable::default();
        assert!(recommend(None, Some(MgDl(100)), &table).is_none());
        assert!(recommend(Some(TrendDirection::Flat), None, &table).is_none());
        assert!(recommend_input(Some(TrendDirection::Flat), "", &table).is_none());
        assert!(recommend_input(Some(TrendDirection::Flat), "0", &table).is_none());
        assert!(recommend_input(Some(TrendDirection::Flat), "-12", &table).is_none());
        assert!(recommend_input(Some(TrendDirection::Flat), "abc", &table).is_none());
        assert!(recommend_input(None, "120", &table).is_none());
    }

    #[test]
    fn test_present_inputs_always_recommend() {
        let table = ProtocolTable::default();
        for trend in TrendDirection::ALL {
            for value in [1u16, 69, 70, 80, 100, 120, 180, 181, 400] {
                assert!(recommend(Some(trend), Some(MgDl(value)), &table).is_some());
            }
        }
    }

    #[test]
    fn test_huge_reading_uses_top_band() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::Flat), "70000", &table).unwrap();
        assert_eq!(rec.band_index, table.band_count() - 1);
        assert_eq!(rec.band.id, "r6");
        assert_eq!(rec.action().main, "No Action");
    }

    #[test]
    fn test_double_down_at_69_falls_to_top_band() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::DoubleDown), "69", &table).unwrap();
        assert_eq!(rec.band_index, 5);
        assert_eq!(rec.carb_amount, CarbValue::None);
        assert_eq!(rec.urgency, UrgencyTier::None);
        assert_eq!(rec.action().main, "No Action");
    }

    #[test]
    fn test_flat_in_range_needs_nothing() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::Flat), "130", &table).unwrap();
        assert_eq!(rec.band_index, 4);
        assert_eq!(rec.band.id, "r5");
        assert_eq!(rec.carb_amount, CarbValue::None);
        assert_eq!(rec.urgency, UrgencyTier::None);
        assert_eq!(rec.action().main, "No Action");
        assert_eq!(rec.action().sub, "Blood sugar is in acceptable range");
    }

    #[test]
    fn test_double_down_high_needs_nothing() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::DoubleDown), "190", &table).unwrap();
        assert_eq!(rec.band_index, 5);
        assert_eq!(rec.carb_amount, CarbValue::None);
        assert_eq!(rec.action().main, "No Action");
    }

    #[test]
    fn test_single_up_low_borderline() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::SingleUp), "75", &table).unwrap();
        assert_eq!(rec.band_index, 1);
        assert_eq!(rec.carb_amount, CarbValue::None);
        assert_eq!(rec.action().main, "No Action");
    }

    #[test]
    fn test_double_down_low_is_urgent() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::DoubleDown), "65", &table).unwrap();
        assert_eq!(rec.band_index, 0);
        assert_eq!(rec.carb_amount, CarbValue::Grams(15));
        assert!(rec.finger_poke);
        assert!(rec.retest);
        assert_eq!(rec.urgency, UrgencyTier::Critical);
        assert_eq!(
            rec.action(),
            ActionText {
                main: "Take 15g Carbs".to_string(),
                sub: "Do a finger poke · Retest ~15 min".to_string(),
            }
        );
    }

    #[test]
    fn test_gram_action_without_flags() {
        let table = ProtocolTable::default();
        let rec = recommend_input(Some(TrendDirection::Flat), "85", &table).unwrap();
        assert_eq!(rec.carb_amount, CarbValue::Grams(2));
        assert_eq!(rec.urgency, UrgencyTier::Low);
        assert_eq!(rec.action().main, "Take 2g Carbs");
        assert_eq!(rec.action().sub, "Recheck ~15 min");
    }

    #[test]
    fn test_sentinel_actions() {
        let table = ProtocolTable::default();
        let pump = recommend_input(Some(TrendDirection::DoubleUp), "250", &table).unwrap();
        assert_eq!(pump.urgency, UrgencyTier::Pump);
        assert_eq!(pump.action().main, "Check Insulin Pump");

        let observe = recommend_input(Some(TrendDirection::DoubleUp), "60", &table).unwrap();
        assert_eq!(observe.urgency, UrgencyTier::None);
        assert_eq!(observe.action().main, "Observe & Recheck");
        assert_eq!(observe.action().sub, "Monitor for ~15 minutes");
    }

    #[test]
    fn test_edited_cell_flows_through() {
        let mut table = ProtocolTable::default();
        table.set_cell(TrendDirection::Flat, 4, "pump").unwrap();
        let rec = recommend_input(Some(TrendDirection::Flat), "130", &table).unwrap();
        assert_eq!(rec.urgency, UrgencyTier::Pump);
        assert_eq!(rec.action().main, "Check Insulin Pump");
    }
}
