//! Display urgency for a recommendation
//!
//! The tier only drives how loudly a recommendation is shown. It is never
//! stored and never feeds back into the dose.

use std::fmt;

use serde::Serialize;

use crate::carbs::CarbValue;
use crate::trend::TrendDirection;

/// Carb dose at or above which a recommendation is urgent
pub const CRITICAL_GRAMS: u16 = 15;
/// Carb dose at or above which a recommendation is moderate
pub const HIGH_GRAMS: u16 = 8;
/// Lowest band index still considered low-to-borderline
const BORDERLINE_BAND: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum UrgencyTier {
    None,
    Pump,
    Low,
    High,
    Critical,
}

impl UrgencyTier {
    /// Rank a cell for display. Rules apply top to bottom, first match wins.
    pub fn classify(carbs: CarbValue, trend: TrendDirection, band: usize) -> Self {
        let grams = match carbs {
            CarbValue::CheckPump => return UrgencyTier::Pump,
            CarbValue::Observe | CarbValue::None => return UrgencyTier::None,
            CarbValue::Grams(g) => g,
        };

        // Falling or dropping fast while already low-ish escalates any dose.
        let falling_fast = trend.index() >= TrendDirection::SingleDown.index();
        if grams >= CRITICAL_GRAMS || (falling_fast && band <= BORDERLINE_BAND) {
            UrgencyTier::Critical
        } else if grams >= HIGH_GRAMS {
            UrgencyTier::High
        } else {
            UrgencyTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UrgencyTier::None => "No Action Needed",
            UrgencyTier::Pump => "Check Pump",
            UrgencyTier::Low => "Mild",
            UrgencyTier::High => "Moderate",
            UrgencyTier::Critical => "Urgent",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
