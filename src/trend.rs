//! CGM trend arrows
//!
//! The seven arrows a CGM receiver can show, ordered from rising fast to
//! falling fast. The ordinal doubles as the protocol table row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// Rate-of-change arrow reported by the CGM
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    DoubleUp,
    SingleUp,
    DiagonalUp,
    Flat,
    DiagonalDown,
    SingleDown,
    DoubleDown,
}

impl TrendDirection {
    /// Number of trend rows in every protocol matrix
    pub const COUNT: usize = 7;

    /// All arrows in row order
    pub const ALL: [TrendDirection; Self::COUNT] = [
        TrendDirection::DoubleUp,
        TrendDirection::SingleUp,
        TrendDirection::DiagonalUp,
        TrendDirection::Flat,
        TrendDirection::DiagonalDown,
        TrendDirection::SingleDown,
        TrendDirection::DoubleDown,
    ];

    /// Row index in the protocol matrices (0..=6)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Arrow glyph as drawn on the receiver
    pub fn symbol(self) -> &'static str {
        match self {
            TrendDirection::DoubleUp => "↑↑",
            TrendDirection::SingleUp => "↑",
            TrendDirection::DiagonalUp => "↗",
            TrendDirection::Flat => "→",
            TrendDirection::DiagonalDown => "↘",
            TrendDirection::SingleDown => "↓",
            TrendDirection::DoubleDown => "↓↓",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::DoubleUp => "Double Up",
            TrendDirection::SingleUp => "Single Up",
            TrendDirection::DiagonalUp => "Diagonal Up",
            TrendDirection::Flat => "Flat",
            TrendDirection::DiagonalDown => "Diagonal Down",
            TrendDirection::SingleDown => "Single Down",
            TrendDirection::DoubleDown => "Double Down",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TrendDirection::DoubleUp => "Rising fast",
            TrendDirection::SingleUp => "Rising",
            TrendDirection::DiagonalUp => "Rising slowly",
            TrendDirection::Flat => "Steady",
            TrendDirection::DiagonalDown => "Falling slowly",
            TrendDirection::SingleDown => "Falling",
            TrendDirection::DoubleDown => "Falling fast",
        }
    }

    /// Kebab-case name used on the command line
    pub fn cli_name(self) -> &'static str {
        match self {
            TrendDirection::DoubleUp => "double-up",
            TrendDirection::SingleUp => "single-up",
            TrendDirection::DiagonalUp => "diagonal-up",
            TrendDirection::Flat => "flat",
            TrendDirection::DiagonalDown => "diagonal-down",
            TrendDirection::SingleDown => "single-down",
            TrendDirection::DoubleDown => "double-down",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol(), self.label())
    }
}

impl FromStr for TrendDirection {
    type Err = CalcError;

    /// Accepts the kebab-case name, the display label, the glyph or the row index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if let Ok(index) = wanted.parse::<usize>() {
            return Self::from_index(index).ok_or_else(|| CalcError::UnknownTrend(s.to_string()));
        }

        let normalized = wanted.to_lowercase().replace(&['_', ' '][..], "-");
        let alias = match normalized.as_str() {
            "up" => Some(TrendDirection::SingleUp),
            "down" => Some(TrendDirection::SingleDown),
            "45-up" => Some(TrendDirection::DiagonalUp),
            "45-down" => Some(TrendDirection::DiagonalDown),
            "steady" => Some(TrendDirection::Flat),
            _ => None,
        };

        alias
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|t| t.cli_name() == normalized || t.symbol() == wanted)
            })
            .ok_or_else(|| CalcError::UnknownTrend(s.to_string()))
    }
}
