use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::remote::LocalBoardStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read board store {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write board store {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("board store {path} is not valid JSON: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize board store: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Write via a temp file in the same directory, then rename over the target
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Load the board store with its sort keys compacted. A missing file is an
/// empty store.
pub fn load_store(path: &Path) -> Result<LocalBoardStore, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no board store yet, starting empty");
            return Ok(LocalBoardStore::new());
        }
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let mut store: LocalBoardStore =
        serde_json::from_str(&text).map_err(|e| StoreError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
    store.compact_positions();
    Ok(store)
}

pub fn save_store(path: &Path, store: &LocalBoardStore) -> Result<(), StoreError> {
    let mut json = serde_json::to_string_pretty(store)?;
    json.push('\n');
    atomic_write(path, json.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "saved board store");
    Ok(())
}
