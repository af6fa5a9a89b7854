use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{Config, DateFormat};

const APP_DIR: &str = "mdboard";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine the user {0} directory")]
    NoHomeDir(&'static str),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config: {0}")]
    EditError(#[from] toml_edit::TomlError),
}

/// `<config dir>/mdboard/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("config.toml"))
        .ok_or(ConfigError::NoHomeDir("config"))
}

/// `<data dir>/mdboard/boards.json`
pub fn default_store_path() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("boards.json"))
        .ok_or(ConfigError::NoHomeDir("data"))
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for round-trip-safe editing. A missing file reads as defaults.
pub fn read_config(path: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let write_err = |e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, doc.to_string()).map_err(write_err)?;
    Ok(())
}

/// Select the board that commands operate on
pub fn set_board(doc: &mut toml_edit::DocumentMut, board_id: &str) {
    doc["board"] = toml_edit::value(board_id);
}

pub fn set_date_format(doc: &mut toml_edit::DocumentMut, format: DateFormat) {
    doc["date_format"] = toml_edit::value(format.key());
}

pub fn set_store(doc: &mut toml_edit::DocumentMut, store: &Path) {
    doc["store"] = toml_edit::value(store.to_string_lossy().into_owned());
}
