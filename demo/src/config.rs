use std::env::var_os;
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use lcd_backpack::lcd::hd44780::driver::FontSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ADDRESS: u8 = 0x27;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum AddressError {
    #[error("not a number")]
    Invalid,
    #[error("{0:#x} is not a 7-bit I2C address")]
    OutOfRange(u32),
}

/// Parses an I2C address given either in hex (`0x27`) or decimal (`39`).
pub fn parse_address(s: &str) -> Result<u8, AddressError> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|_| AddressError::Invalid)?;

    if value > 0x7F {
        return Err(AddressError::OutOfRange(value));
    }
    Ok(value as u8)
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FontConfig {
    #[default]
    #[serde(rename = "5x8")]
    Dots5x8,
    #[serde(rename = "5x10")]
    Dots5x10,
}

impl From<FontConfig> for FontSize {
    fn from(font: FontConfig) -> Self {
        match font {
            FontConfig::Dots5x8 => FontSize::Dots5x8,
            FontConfig::Dots5x10 => FontSize::Dots5x10,
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub columns: u8,
    pub lines: u8,
    pub font: FontConfig,
}

impl DisplayConfig {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("BACKPACK_CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("display.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            Self::from_reader(std::io::BufReader::new(file)).ok()
        } else {
            None
        }
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            columns: 16,
            lines: 2,
            font: FontConfig::Dots5x8,
        }
    }
}
