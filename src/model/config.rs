use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// User configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// API token for the remote board service
    #[serde(default)]
    pub token: Option<String>,
    /// Currently selected board ID
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub date_format: DateFormat,
    /// Path to the local JSON board store
    #[serde(default)]
    pub store: Option<PathBuf>,
}

/// How due dates are written in the board document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// YYYY-MM-DD
    #[default]
    Iso,
    /// MM-DD-YYYY
    Us,
    /// DD-MM-YYYY
    Eu,
}

impl DateFormat {
    pub const ALL: [DateFormat; 3] = [DateFormat::Iso, DateFormat::Us, DateFormat::Eu];

    /// chrono pattern for the date part
    pub fn date_pattern(self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::Us => "%m-%d-%Y",
            DateFormat::Eu => "%d-%m-%Y",
        }
    }

    /// chrono pattern for date plus time of day
    pub fn datetime_pattern(self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d %H:%M",
            DateFormat::Us => "%m-%d-%Y %H:%M",
            DateFormat::Eu => "%d-%m-%Y %H:%M",
        }
    }

    /// Human-readable label for menus and `config show`
    pub fn label(self) -> &'static str {
        match self {
            DateFormat::Iso => "International (YYYY-MM-DD)",
            DateFormat::Us => "US (MM-DD-YYYY)",
            DateFormat::Eu => "European (DD-MM-YYYY)",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DateFormat::Iso => "iso",
            DateFormat::Us => "us",
            DateFormat::Eu => "eu",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFormat::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown date format '{}' (expected iso, us or eu)", s))
    }
}
