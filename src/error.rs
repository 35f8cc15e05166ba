//! Error types for the carb guide

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Invalid protocol cell input: {0:?}")]
    InvalidCellInput(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Protocol cell out of range: trend {trend}, band {band}")]
    CellOutOfRange { trend: usize, band: usize },

    #[error("Malformed protocol table: {0}")]
    MalformedTable(String),

    #[error("Unknown trend direction: {0}")]
    UnknownTrend(String),

    #[error("Unknown contact field: {0}")]
    UnknownContactField(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
