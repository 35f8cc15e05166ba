//! Treatment protocol table and its editor
//!
//! The table pairs every trend arrow with every glucose band. Each pairing
//! holds the carb action plus the finger-poke and retest flags. Cells are
//! stored as one flat row-major grid so the three values can never drift out
//! of shape; the JSON form keeps the three separate matrices that the stored
//! `settings` slice has always used.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::bands::{validate_bands, Band};
use crate::carbs::CarbValue;
use crate::error::CalcError;
use crate::trend::TrendDirection;

/// Everything the protocol says for one (trend, band) pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolCell {
    pub carbs: CarbValue,
    /// Only meaningful when `carbs` is a gram dose
    pub finger_poke: bool,
    /// Only meaningful when `carbs` is a gram dose
    pub retest: bool,
}

/// Caregiver-editable protocol: bands plus a 7 × N grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableWire", into = "TableWire")]
pub struct ProtocolTable {
    bands: Vec<Band>,
    cells: Vec<ProtocolCell>,
}

/// Serialized layout: bands and three parallel `[trend][band]` matrices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableWire {
    #[serde(alias = "ranges")]
    pub bands: Vec<Band>,
    #[serde(alias = "carbAmounts")]
    pub carb_amount: Vec<Vec<CarbValue>>,
    pub finger_poke: Vec<Vec<bool>>,
    pub retest: Vec<Vec<bool>>,
}

/// Built-in bands
pub fn default_bands() -> Vec<Band> {
    vec![
        Band::new("r1", "<69", None, Some(69)),
        Band::new("r2", "70–80", Some(70), Some(80)),
        Band::new("r3", "80–100", Some(80), Some(100)),
        Band::new("r4", "100–120", Some(100), Some(120)),
        Band::new("r5", "120–180", Some(120), Some(180)),
        Band::new("r6", "180+", Some(180), None),
    ]
}

const N: CarbValue = CarbValue::None;
const OBS: CarbValue = CarbValue::Observe;
const PUMP: CarbValue = CarbValue::CheckPump;

const fn g(grams: u16) -> CarbValue {
    CarbValue::Grams(grams)
}

const DEFAULT_CARBS: [[CarbValue; 6]; TrendDirection::COUNT] = [
    [OBS, N, N, N, N, PUMP],
    [OBS, N, N, N, N, N],
    [OBS, OBS, N, N, N, N],
    [g(8), g(4), g(2), N, N, N],
    [g(12), g(8), g(4), g(2), N, N],
    [g(15), g(15), g(8), g(4), N, N],
    [g(15), g(15), g(15), g(12), g(8), N],
];

const DEFAULT_FINGER_POKE: [[bool; 6]; TrendDirection::COUNT] = [
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [true, false, false, false, false, false],
    [true, true, false, false, false, false],
];

const DEFAULT_RETEST: [[bool; 6]; TrendDirection::COUNT] = [
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [true, true, false, false, false, false],
    [true, true, false, false, false, false],
    [true, true, true, true, true, false],
];

impl Default for ProtocolTable {
    fn default() -> Self {
        let cells = (0..TrendDirection::COUNT)
            .flat_map(|row| {
                (0..6).map(move |col| ProtocolCell {
                    carbs: DEFAULT_CARBS[row][col],
                    finger_poke: DEFAULT_FINGER_POKE[row][col],
                    retest: DEFAULT_RETEST[row][col],
                })
            })
            .collect();

        Self {
            bands: default_bands(),
            cells,
        }
    }
}

impl ProtocolTable {
    /// Build a table from bands and the three `[trend][band]` matrices.
    ///
    /// Fails unless the bands are valid and every matrix is exactly
    /// 7 rows of `bands.len()` columns.
    pub fn from_parts(
        bands: Vec<Band>,
        carb_amount: Vec<Vec<CarbValue>>,
        finger_poke: Vec<Vec<bool>>,
        retest: Vec<Vec<bool>>,
    ) -> Result<Self, CalcError> {
        validate_bands(&bands)?;
        let width = bands.len();
        check_shape("carbAmount", &carb_amount, width)?;
        check_shape("fingerPoke", &finger_poke, width)?;
        check_shape("retest", &retest, width)?;

        let cells = carb_amount
            .iter()
            .zip(&finger_poke)
            .zip(&retest)
            .flat_map(|((carbs, pokes), retests)| {
                carbs
                    .iter()
                    .zip(pokes)
                    .zip(retests)
                    .map(|((&carbs, &finger_poke), &retest)| ProtocolCell {
                        carbs,
                        finger_poke,
                        retest,
                    })
            })
            .collect();

        Ok(Self { bands, cells })
    }

    /// Parse the stored `settings` JSON
    pub fn from_json(json: &str) -> Result<Self, CalcError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CalcError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Cell for a trend row and band column
    pub fn cell(&self, trend: TrendDirection, band: usize) -> Option<&ProtocolCell> {
        self.offset(trend, band).map(|i| &self.cells[i])
    }

    /// One trend row, left to right
    pub fn row(&self, trend: TrendDirection) -> &[ProtocolCell] {
        let start = trend.index() * self.bands.len();
        &self.cells[start..start + self.bands.len()]
    }

    fn offset(&self, trend: TrendDirection, band: usize) -> Option<usize> {
        (band < self.bands.len()).then(|| trend.index() * self.bands.len() + band)
    }

    fn cell_mut(&mut self, trend: TrendDirection, band: usize) -> Result<&mut ProtocolCell, CalcError> {
        match self.offset(trend, band) {
            Some(i) => Ok(&mut self.cells[i]),
            None => Err(CalcError::CellOutOfRange {
                trend: trend.index(),
                band,
            }),
        }
    }

    /// Parse caregiver input into a cell's carb action.
    ///
    /// On bad input the cell keeps its previous value.
    pub fn set_cell(&mut self, trend: TrendDirection, band: usize, raw: &str) -> Result<CarbValue, CalcError> {
        let cell = self.cell_mut(trend, band)?;
        let value = CarbValue::parse(raw)?;
        debug!("Cell {} / band {}: {} -> {}", trend.label(), band, cell.carbs, value);
        cell.carbs = value;
        Ok(value)
    }

    pub fn set_finger_poke(&mut self, trend: TrendDirection, band: usize, on: bool) -> Result<(), CalcError> {
        self.cell_mut(trend, band)?.finger_poke = on;
        Ok(())
    }

    pub fn set_retest(&mut self, trend: TrendDirection, band: usize, on: bool) -> Result<(), CalcError> {
        self.cell_mut(trend, band)?.retest = on;
        Ok(())
    }

    /// Replace the whole table with the built-in defaults
    pub fn reset_to_defaults(&mut self) {
        info!("Protocol table reset to defaults");
        *self = Self::default();
    }

    /// Whether the table still matches the built-in defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn matrix<T>(&self, pick: impl Fn(&ProtocolCell) -> T) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.bands.len())
            .map(|row| row.iter().map(&pick).collect())
            .collect()
    }
}

fn check_shape<T>(name: &str, matrix: &[Vec<T>], width: usize) -> Result<(), CalcError> {
    if matrix.len() != TrendDirection::COUNT {
        return Err(CalcError::MalformedTable(format!(
            "{} has {} rows, expected {}",
            name,
            matrix.len(),
            TrendDirection::COUNT
        )));
    }
    if let Some((row, cols)) = matrix.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(CalcError::MalformedTable(format!(
            "{} row {} has {} columns, expected {}",
            name,
            row,
            cols.len(),
            width
        )));
    }
    Ok(())
}

impl TryFrom<TableWire> for ProtocolTable {
    type Error = CalcError;

    fn try_from(wire: TableWire) -> Result<Self, Self::Error> {
        Self::from_parts(wire.bands, wire.carb_amount, wire.finger_poke, wire.retest)
    }
}

impl From<ProtocolTable> for TableWire {
    fn from(table: ProtocolTable) -> Self {
        TableWire {
            carb_amount: table.matrix(|c| c.carbs),
            finger_poke: table.matrix(|c| c.finger_poke),
            retest: table.matrix(|c| c.retest),
            bands: table.bands,
        }
    }
}
