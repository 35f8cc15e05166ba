//! Glucose reading type and input parsing
//!
//! Readings are whole mg/dL values as shown on the CGM receiver. Anything that
//! is not a positive integer is treated as "no reading" rather than an error.

use serde::{Deserialize, Serialize};

/// Glucose value in mg/dL (milligrams per deciliter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MgDl(pub u16);

impl MgDl {
    /// Parse free-text reading input.
    ///
    /// Returns `None` for empty, non-numeric, zero or negative input. Values
    /// too large for `u16` saturate, so they still land in the top band.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match trimmed.parse::<u16>() {
            Ok(0) => None,
            Ok(value) => Some(MgDl(value)),
            // All digits and not zero: only overflow is left
            Err(_) if trimmed.bytes().any(|b| b != b'0') => Some(MgDl(u16::MAX)),
            Err(_) => None,
        }
    }
}
