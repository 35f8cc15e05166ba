//! Glucose bands and reading classification
//!
//! Bands are an ordered list covering every mg/dL value. The first band holds
//! readings strictly below its `max`, the last is open above, and interior
//! bands are closed intervals. Neighbouring bands either share their boundary
//! value or sit on consecutive integers (`70–80` followed by `81–100`).
//!
//! The first-band test is strict. With the default `<69` / `70–80` bands a
//! reading of exactly 69 matches neither and drops through to the top band;
//! that is how the protocol has always classified it.

use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::units::MgDl;

/// One glucose interval used as a protocol table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u16>,
}

impl Band {
    pub fn new(id: &str, label: &str, min: Option<u16>, max: Option<u16>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            min,
            max,
        }
    }

    /// Whether a reading falls inside this band's own bounds
    pub fn contains(&self, reading: MgDl) -> bool {
        let above_min = self.min.map_or(true, |min| reading.0 >= min);
        let below_max = self.max.map_or(true, |max| reading.0 <= max);
        above_min && below_max
    }

    /// Range text in mg/dL, e.g. `70–80 mg/dL`
    pub fn format_range(&self) -> String {
        match (self.min, self.max) {
            (None, Some(max)) => format!("<{} mg/dL", max),
            (Some(min), None) => format!("≥{} mg/dL", min),
            (Some(min), Some(max)) => format!("{}–{} mg/dL", min, max),
            (None, None) => "any".to_string(),
        }
    }
}

/// Check that a band list covers the whole line in ascending order.
pub fn validate_bands(bands: &[Band]) -> Result<(), CalcError> {
    if bands.len() < 2 {
        return Err(CalcError::MalformedTable(format!(
            "need at least 2 bands, found {}",
            bands.len()
        )));
    }

    let last = bands.len() - 1;
    for (i, band) in bands.iter().enumerate() {
        let (needs_min, needs_max) = (i != 0, i != last);
        if needs_min != band.min.is_some() || needs_max != band.max.is_some() {
            return Err(CalcError::MalformedTable(format!(
                "band {} ({}) has the wrong bounds for its position",
                i, band.id
            )));
        }
        if let (Some(min), Some(max)) = (band.min, band.max) {
            if min > max {
                return Err(CalcError::MalformedTable(format!(
                    "band {} ({}) has min {} above max {}",
                    i, band.id, min, max
                )));
            }
        }
    }

    for (i, pair) in bands.windows(2).enumerate() {
        // Both present: the position check above guarantees it.
        let (Some(upper), Some(next_min)) = (pair[0].max, pair[1].min) else {
            continue;
        };
        if next_min != upper && Some(next_min) != upper.checked_add(1) {
            return Err(CalcError::MalformedTable(format!(
                "gap or overlap between band {} (max {}) and band {} (min {})",
                i,
                upper,
                i + 1,
                next_min
            )));
        }
    }

    Ok(())
}

/// Map a reading to a band index.
///
/// Band 0 takes readings below its `max`. Interior bands are scanned upward
/// and the first whose closed bounds contain the reading wins, so a value on
/// a shared interior boundary lands in the lower band. Anything else falls
/// into the open top band. Callers reject non-positive readings before
/// getting here; `bands` must hold at least two entries.
pub fn classify(reading: MgDl, bands: &[Band]) -> usize {
    let last = bands.len().saturating_sub(1);
    if bands.first().and_then(|b| b.max).map_or(false, |max| reading.0 < max) {
        return 0;
    }
    (1..last)
        .find(|&i| bands[i].contains(reading))
        .unwrap_or(last)
}
