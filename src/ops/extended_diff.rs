use serde_json::{Map, Value};

use crate::model::action::Action;
use crate::model::config::DateFormat;
use crate::model::extended::{ExtendedSection, FieldChange};
use crate::model::fields::{self, FieldKind, FieldSpec};
use crate::parse::dates::display_to_remote;
use crate::parse::extended_parser::{ExtendedError, parse_extended};

/// Convert a field's text to the value sent to the remote API. Blank means
/// unset.
fn coerce(spec: &FieldSpec, raw: &str, format: DateFormat) -> Result<Value, ExtendedError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(Value::Null);
    }
    match spec.kind {
        FieldKind::Bool => match value {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ExtendedError::InvalidBool {
                field: spec.name.to_string(),
                value: value.to_string(),
            }),
        },
        FieldKind::Date => display_to_remote(value, format)
            .map(Value::String)
            .ok_or_else(|| ExtendedError::InvalidDate {
                field: spec.name.to_string(),
                value: value.to_string(),
            }),
        FieldKind::Position => match value.parse::<f64>() {
            Ok(p) if p >= 0.0 => Ok(Value::String(value.to_string())),
            _ => Err(ExtendedError::InvalidPosition {
                field: spec.name.to_string(),
                value: value.to_string(),
            }),
        },
        FieldKind::Text | FieldKind::Choice(_) | FieldKind::Description => {
            Ok(Value::String(raw.to_string()))
        }
    }
}

/// Compare sections field by field and fold each object's changes into one
/// bulk update. Sections are matched by object type and ID; a section with
/// no counterpart in `before` counts as entirely changed, and a section
/// removed altogether leaves its object alone.
///
/// Every field of an original section must still be present in its edited
/// copy: a deleted `Field:` line is rejected with
/// [`ExtendedError::MissingField`] rather than guessed at. Unsetting a field
/// means leaving its value blank.
pub fn diff_extended(
    before: &[ExtendedSection],
    after: &[ExtendedSection],
    format: DateFormat,
) -> Result<Vec<Action>, ExtendedError> {
    let mut actions = Vec::new();

    for section in after {
        let original = before
            .iter()
            .find(|s| s.object == section.object && s.id == section.id);

        if let Some(original) = original {
            check_complete(original, section)?;
        }

        let mut api_fields = Map::new();
        let mut changes = Vec::new();
        for (key, new_value) in &section.fields {
            let old_value = original.and_then(|s| s.fields.get(key));
            if old_value == Some(new_value) {
                continue;
            }
            let spec = fields::lookup(section.object, key).ok_or_else(|| {
                ExtendedError::UnknownField {
                    object: section.object,
                    field: key.clone(),
                }
            })?;
            api_fields.insert(spec.api.to_string(), coerce(spec, new_value, format)?);
            changes.push(FieldChange {
                field: spec.name.to_string(),
                old: old_value.cloned().unwrap_or_default(),
                new: new_value.clone(),
            });
        }

        if !api_fields.is_empty() {
            actions.push(Action::BulkUpdate {
                object: section.object,
                object_id: section.id.clone(),
                object_name: section.name.clone(),
                fields: api_fields,
                changes,
            });
        }
    }
    Ok(actions)
}

/// Fail on the first field of `original` that `edited` dropped. A field
/// written under one of its aliases still counts.
fn check_complete(
    original: &ExtendedSection,
    edited: &ExtendedSection,
) -> Result<(), ExtendedError> {
    let api_of = |key: &str| fields::lookup(edited.object, key).map(|spec| spec.api);
    for key in original.fields.keys() {
        let api = api_of(key);
        let present = edited
            .fields
            .keys()
            .any(|k| k == key || (api.is_some() && api_of(k) == api));
        if !present {
            return Err(ExtendedError::MissingField {
                object: edited.object,
                name: edited.name.clone(),
                field: key.clone(),
            });
        }
    }
    Ok(())
}

/// Parse the pristine and edited extended documents and diff them
pub fn diff_extended_text(
    original: &str,
    edited: &str,
    format: DateFormat,
) -> Result<Vec<Action>, ExtendedError> {
    let before = parse_extended(original)?;
    let after = parse_extended(edited)?;
    diff_extended(&before, &after, format)
}
