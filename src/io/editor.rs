//! Hand a document to the user's editor and read it back.

use std::fs;
use std::io::{self, Write};
use std::process::Command;

use tracing::debug;

const FALLBACK_EDITOR: &str = "vi";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor command is empty")]
    EmptyCommand,
    #[error("could not launch editor '{program}': {source}")]
    Launch { program: String, source: io::Error },
    #[error("editor '{program}' exited with status {code}")]
    Failed { program: String, code: i32 },
    #[error("temp file error: {0}")]
    Io(#[from] io::Error),
}

/// Editor command from `$VISUAL`, then `$EDITOR`, else `vi`
pub fn editor_command() -> String {
    pick_editor(std::env::var("VISUAL").ok(), std::env::var("EDITOR").ok())
}

fn pick_editor(visual: Option<String>, editor: Option<String>) -> String {
    visual
        .filter(|v| !v.trim().is_empty())
        .or_else(|| editor.filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Write `initial` to a temp `.md` file, open it in the user's editor and
/// return the saved content
pub fn edit_text(initial: &str, prefix: &str) -> Result<String, EditorError> {
    edit_text_with(&editor_command(), initial, prefix)
}

/// Same as [`edit_text`] with an explicit editor command. Commands with
/// arguments (`code -w`) are split on whitespace.
pub fn edit_text_with(command: &str, initial: &str, prefix: &str) -> Result<String, EditorError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(EditorError::EmptyCommand)?;
    let args: Vec<&str> = parts.collect();

    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".md")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    debug!(editor = program, path = %file.path().display(), "opening editor");
    let status = Command::new(program)
        .args(&args)
        .arg(file.path())
        .status()
        .map_err(|e| EditorError::Launch {
            program: program.to_string(),
            source: e,
        })?;
    if !status.success() {
        return Err(EditorError::Failed {
            program: program.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }

    Ok(fs::read_to_string(file.path())?)
}
