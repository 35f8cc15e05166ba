//! Configuration file parsing and data locations

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::CalcError;

const APP_DIR: &str = "carbguide";
const DATABASE_FILE: &str = "carbguide.db";
const CONFIG_FILE: &str = "config.txt";

const DEFAULT_CONFIG: &str = "\
# carbguide configuration
#
# database_path <path>   Where protocol, contacts and confirmation are stored.
#                        Defaults to carbguide.db in the data directory.
";

/// Configuration loaded from config.txt
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Override for the key-value database location
    pub database_path: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CalcError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse `key value  # comment` lines; unknown keys are skipped
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, CalcError> {
        let mut config = Config::default();

        for line in reader.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, rest)) = Self::parse_line(line) {
                // Extract value before any comment
                let value = rest.split('#').next().unwrap_or("").trim();
                if key == "database_path" && !value.is_empty() {
                    config.database_path = Some(value.to_string());
                }
            }
        }

        Ok(config)
    }

    /// Parse a single config line, returning (key, value)
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        // Find first whitespace to separate key from value
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();

        if key.is_empty() || value.is_empty() {
            return None;
        }

        Some((key, value))
    }

    /// Write the commented template config
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<(), CalcError> {
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }
}

/// OS data directory for the app, or the working directory if there is none
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn ensure_data_dir() -> Result<PathBuf, CalcError> {
    let dir = get_data_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn default_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}

pub fn config_file_path() -> PathBuf {
    get_data_dir().join(CONFIG_FILE)
}
