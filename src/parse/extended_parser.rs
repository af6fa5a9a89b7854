use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::model::extended::{ExtendedSection, ObjectType};

pub const SEPARATOR_WIDTH: usize = 60;
pub const HEADER_PREFIX: &str = "# EDITING ";
pub const DESCRIPTION_START: &str = "=== DESCRIPTION START ===";
pub const DESCRIPTION_END: &str = "=== DESCRIPTION END ===";
/// Field key the description block is stored under
pub const DESCRIPTION_FIELD: &str = "Description";

/// A `#` only starts a comment when whitespace precedes and follows it, so
/// values like `Fix #12` survive.
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#(\s|$)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtendedError {
    #[error("line {line}: malformed section header: {text}")]
    MalformedHeader { line: usize, text: String },
    #[error("line {line}: unknown object type '{name}'")]
    UnknownObjectType { line: usize, name: String },
    #[error("line {line}: description block is never closed")]
    UnterminatedDescription { line: usize },
    #[error("line {line}: unexpected content: {text}")]
    UnexpectedLine { line: usize, text: String },
    #[error("unknown field '{field}' for {object}")]
    UnknownField { object: ObjectType, field: String },
    #[error("{object} '{name}' is missing field '{field}' (leave the value blank to unset it)")]
    MissingField {
        object: ObjectType,
        name: String,
        field: String,
    },
    #[error("field '{field}' expects true or false, got '{value}'")]
    InvalidBool { field: String, value: String },
    #[error("field '{field}' has an unreadable date '{value}'")]
    InvalidDate { field: String, value: String },
    #[error("field '{field}' expects a non-negative position, got '{value}'")]
    InvalidPosition { field: String, value: String },
}

fn is_separator(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '=')
}

/// Remove a trailing `# comment` from a field value
pub fn strip_comment(value: &str) -> &str {
    match COMMENT_RE.find(value) {
        Some(m) => &value[..m.start()],
        None => value,
    }
}

/// `# EDITING CARD: <name> {<id>}`
fn parse_header(text: &str, line: usize) -> Result<(ObjectType, String, String), ExtendedError> {
    let malformed = || ExtendedError::MalformedHeader {
        line,
        text: text.to_string(),
    };
    let rest = text.strip_prefix(HEADER_PREFIX).ok_or_else(malformed)?;
    let (kind, rest) = rest.split_once(':').ok_or_else(malformed)?;
    let object = ObjectType::from_header_name(kind.trim()).ok_or_else(|| {
        ExtendedError::UnknownObjectType {
            line,
            name: kind.trim().to_string(),
        }
    })?;
    let rest = rest.trim();
    let open = rest.rfind('{').ok_or_else(malformed)?;
    let id = rest[open..]
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(malformed)?;
    Ok((object, rest[..open].trim().to_string(), id.to_string()))
}

/// Parse an extended document into its sections, in document order
pub fn parse_extended(text: &str) -> Result<Vec<ExtendedSection>, ExtendedError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sections = Vec::new();
    let mut current: Option<ExtendedSection> = None;
    let mut idx = 0;

    while idx < lines.len() {
        let line_no = idx + 1;
        let line = lines[idx].trim();
        idx += 1;

        if line.is_empty() || is_separator(line) {
            continue;
        }

        if line.starts_with(HEADER_PREFIX.trim_end()) {
            let (object, name, id) = parse_header(line, line_no)?;
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(ExtendedSection {
                object,
                id,
                name,
                fields: IndexMap::new(),
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            return Err(ExtendedError::UnexpectedLine {
                line: line_no,
                text: line.to_string(),
            });
        };

        if line == DESCRIPTION_START {
            let mut body = Vec::new();
            loop {
                let Some(raw) = lines.get(idx) else {
                    return Err(ExtendedError::UnterminatedDescription { line: line_no });
                };
                idx += 1;
                if raw.trim() == DESCRIPTION_END {
                    break;
                }
                body.push(raw.trim_end());
            }
            let description = body.join("\n").trim_matches('\n').to_string();
            section
                .fields
                .insert(DESCRIPTION_FIELD.to_string(), description);
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                let value = strip_comment(value).trim();
                section
                    .fields
                    .insert(key.trim().to_string(), value.to_string());
            }
            _ => {
                return Err(ExtendedError::UnexpectedLine {
                    line: line_no,
                    text: line.to_string(),
                });
            }
        }
    }

    if let Some(done) = current {
        sections.push(done);
    }
    Ok(sections)
}
