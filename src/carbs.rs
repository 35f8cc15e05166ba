//! Protocol cell values
//!
//! A cell either holds a carb dose in grams or one of the non-dose codes.
//! On disk a cell is `null`, a gram count, `"observe"` or `"pump"`; the older
//! numeric codes `-1` (observe) and `-2` (pump) are still read.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// Contents of one protocol cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<RawCell>", into = "Option<RawCell>")]
pub enum CarbValue {
    /// No action
    #[default]
    None,
    /// Observe and recheck
    Observe,
    /// Check the insulin pump
    CheckPump,
    /// Take this many grams of carbohydrate
    Grams(u16),
}

impl CarbValue {
    /// Parse what a caregiver typed into a cell.
    ///
    /// Blank, `none`, `-` and `–` clear the cell; `obs`/`observe` and `pump`
    /// select the codes; anything else must be a non-negative whole number,
    /// optionally suffixed with `g`.
    pub fn parse(input: &str) -> Result<Self, CalcError> {
        let value = input.trim().to_lowercase();
        match value.as_str() {
            "" | "none" | "-" | "–" => Ok(CarbValue::None),
            "obs" | "observe" => Ok(CarbValue::Observe),
            "pump" => Ok(CarbValue::CheckPump),
            other => {
                let digits = other.strip_suffix('g').unwrap_or(other).trim_end();
                digits
                    .parse::<u16>()
                    .map(CarbValue::Grams)
                    .map_err(|_| CalcError::InvalidCellInput(input.to_string()))
            }
        }
    }

    /// Text used to pre-fill the cell editor
    pub fn edit_text(self) -> String {
        match self {
            CarbValue::None => String::new(),
            CarbValue::Observe => "obs".to_string(),
            CarbValue::CheckPump => "pump".to_string(),
            CarbValue::Grams(g) => g.to_string(),
        }
    }
}

impl fmt::Display for CarbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarbValue::None => write!(f, "–"),
            CarbValue::Observe => write!(f, "Obs"),
            CarbValue::CheckPump => write!(f, "Pump"),
            CarbValue::Grams(g) => write!(f, "{}g", g),
        }
    }
}

/// Serialized shape of a cell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(i64),
    Code(String),
}

const OBSERVE_CODE: &str = "observe";
const PUMP_CODE: &str = "pump";
const LEGACY_OBSERVE: i64 = -1;
const LEGACY_PUMP: i64 = -2;

impl TryFrom<Option<RawCell>> for CarbValue {
    type Error = String;

    fn try_from(raw: Option<RawCell>) -> Result<Self, Self::Error> {
        match raw {
            None => Ok(CarbValue::None),
            Some(RawCell::Number(LEGACY_OBSERVE)) => Ok(CarbValue::Observe),
            Some(RawCell::Number(LEGACY_PUMP)) => Ok(CarbValue::CheckPump),
            Some(RawCell::Number(n)) => u16::try_from(n)
                .map(CarbValue::Grams)
                .map_err(|_| format!("carb amount out of range: {}", n)),
            Some(RawCell::Code(code)) => match code.as_str() {
                OBSERVE_CODE => Ok(CarbValue::Observe),
                PUMP_CODE => Ok(CarbValue::CheckPump),
                other => Err(format!("unknown cell code: {}", other)),
            },
        }
    }
}

impl From<CarbValue> for Option<RawCell> {
    fn from(value: CarbValue) -> Self {
        match value {
            CarbValue::None => None,
            CarbValue::Observe => Some(RawCell::Code(OBSERVE_CODE.to_string())),
            CarbValue::CheckPump => Some(RawCell::Code(PUMP_CODE.to_string())),
            CarbValue::Grams(g) => Some(RawCell::Number(i64::from(g))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(CarbValue::parse("").unwrap(), CarbValue::None);
        assert_eq!(CarbValue::parse("  ").unwrap(), CarbValue::None);
        assert_eq!(CarbValue::parse("none").unwrap(), CarbValue::None);
        assert_eq!(CarbValue::parse("-").unwrap(), CarbValue::None);
        assert_eq!(CarbValue::parse("obs").unwrap(), CarbValue::Observe);
        assert_eq!(CarbValue::parse("OBSERVE").unwrap(), CarbValue::Observe);
        assert_eq!(CarbValue::parse("Pump").unwrap(), CarbValue::CheckPump);
    }

    #[test]
    fn test_parse_grams() {
        assert_eq!(CarbValue::parse("15").unwrap(), CarbValue::Grams(15));
        assert_eq!(CarbValue::parse(" 8 ").unwrap(), CarbValue::Grams(8));
        assert_eq!(CarbValue::parse("12g").unwrap(), CarbValue::Grams(12));
        assert_eq!(CarbValue::parse("0").unwrap(), CarbValue::Grams(0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["xyz", "-5", "4.5", "g", "12 grams", "pumpp"] {
            match CarbValue::parse(input) {
                Err(CalcError::InvalidCellInput(text)) => assert_eq!(text, input),
                other => panic!("expected InvalidCellInput for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_display_and_edit_text() {
        assert_eq!(CarbValue::None.to_string(), "–");
        assert_eq!(CarbValue::Observe.to_string(), "Obs");
        assert_eq!(CarbValue::CheckPump.to_string(), "Pump");
        assert_eq!(CarbValue::Grams(15).to_string(), "15g");
        assert_eq!(CarbValue::Observe.edit_text(), "obs");
        assert_eq!(CarbValue::None.edit_text(), "");

        // Whatever the table shows can be typed back in.
        for value in [CarbValue::None, CarbValue::Observe, CarbValue::CheckPump, CarbValue::Grams(4)] {
            assert_eq!(CarbValue::parse(&value.to_string()).unwrap(), value);
        }
    }

    #[test]
    fn test_json_wire_form() {
        let row = vec![CarbValue::Observe, CarbValue::None, CarbValue::Grams(8), CarbValue::CheckPump];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["observe",null,8,"pump"]"#);
    }

    #[test]
    fn test_json_reads_legacy_codes() {
        let row: Vec<CarbValue> = serde_json::from_str("[-1, null, 12, -2]").unwrap();
        assert_eq!(
            row,
            vec![CarbValue::Observe, CarbValue::None, CarbValue::Grams(12), CarbValue::CheckPump]
        );
        assert!(serde_json::from_str::<Vec<CarbValue>>("[-7]").is_err());
        assert!(serde_json::from_str::<Vec<CarbValue>>(r#"["later"]"#).is_err());
    }
}
