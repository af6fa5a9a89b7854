use indexmap::IndexMap;

use crate::model::board::{Board, Card, List};
use crate::model::config::DateFormat;
use crate::model::extended::{ExtendedSection, ExtendedTarget, ObjectType};
use crate::model::fields::{self, FieldKind};
use crate::parse::dates::remote_to_display;
use crate::parse::extended_parser::{
    DESCRIPTION_END, DESCRIPTION_FIELD, DESCRIPTION_START, HEADER_PREFIX, SEPARATOR_WIDTH,
};
use crate::remote::{BoardClient, RemoteError};

fn bool_text(value: bool) -> String {
    value.to_string()
}

fn position_text(pos: f64) -> String {
    format!("{}", pos)
}

fn date_text(remote: Option<&str>, format: DateFormat) -> String {
    remote
        .and_then(|r| remote_to_display(r, format))
        .unwrap_or_default()
}

fn section(
    object: ObjectType,
    id: &str,
    name: &str,
    values: Vec<(&'static str, String)>,
) -> ExtendedSection {
    let mut fields = IndexMap::new();
    for (key, value) in values {
        fields.insert(key.to_string(), value);
    }
    ExtendedSection {
        object,
        id: id.to_string(),
        name: name.to_string(),
        fields,
    }
}

pub fn board_section(board: &Board) -> ExtendedSection {
    let prefs = &board.prefs;
    section(
        ObjectType::Board,
        &board.id,
        &board.name,
        vec![
            (DESCRIPTION_FIELD, board.desc.clone()),
            ("Name", board.name.clone()),
            ("Closed", bool_text(board.closed)),
            ("Permission Level", prefs.permission_level.clone()),
            ("Self Join", bool_text(prefs.self_join)),
            ("Card Covers", bool_text(prefs.card_covers)),
            ("Hide Votes", bool_text(prefs.hide_votes)),
            ("Invitations", prefs.invitations.clone()),
            ("Voting", prefs.voting.clone()),
            ("Comments", prefs.comments.clone()),
            ("Card Aging", prefs.card_aging.clone()),
            ("Calendar Feed", bool_text(prefs.calendar_feed_enabled)),
        ],
    )
}

pub fn list_section(list: &List) -> ExtendedSection {
    section(
        ObjectType::List,
        &list.id,
        &list.name,
        vec![
            ("Name", list.name.clone()),
            ("Closed", bool_text(list.closed)),
            ("Position", position_text(list.pos)),
            ("Subscribed", bool_text(list.subscribed)),
        ],
    )
}

pub fn card_section(card: &Card, format: DateFormat) -> ExtendedSection {
    section(
        ObjectType::Card,
        &card.id,
        &card.name,
        vec![
            (DESCRIPTION_FIELD, card.desc.clone()),
            ("Name", card.name.clone()),
            ("Closed", bool_text(card.closed)),
            ("Position", position_text(card.pos)),
            ("Subscribed", bool_text(card.subscribed)),
            ("Start Date", date_text(card.start.as_deref(), format)),
            ("Due Date", date_text(card.due.as_deref(), format)),
            ("Due Complete", bool_text(card.due_complete)),
        ],
    )
}

/// Fetch the current state of every flagged object
pub fn load_sections(
    targets: &[ExtendedTarget],
    client: &dyn BoardClient,
    format: DateFormat,
) -> Result<Vec<ExtendedSection>, RemoteError> {
    targets
        .iter()
        .map(|target| match target.object {
            ObjectType::Board => client.fetch_board(&target.id).map(|b| board_section(&b)),
            ObjectType::List => client.fetch_list(&target.id).map(|l| list_section(&l)),
            ObjectType::Card => client
                .fetch_card(&target.id)
                .map(|c| card_section(&c, format)),
        })
        .collect()
}

fn field_comment(object: ObjectType, key: &str, format: DateFormat) -> Option<String> {
    let spec = fields::lookup(object, key)?;
    match spec.kind {
        FieldKind::Bool => Some("true or false".to_string()),
        FieldKind::Date => Some(format!("{}, optional HH:MM", format.label())),
        FieldKind::Position => Some("position among siblings".to_string()),
        FieldKind::Choice(options) => Some(options.join(", ")),
        FieldKind::Text | FieldKind::Description => None,
    }
}

/// Render sections as an extended document
pub fn render_sections(sections: &[ExtendedSection], format: DateFormat) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(separator.clone());
        lines.push(format!(
            "{}{}: {} {{{}}}",
            HEADER_PREFIX,
            section.object.header_name(),
            section.name,
            section.id
        ));
        lines.push(separator.clone());

        if let Some(desc) = section.fields.get(DESCRIPTION_FIELD) {
            lines.push(DESCRIPTION_START.to_string());
            if !desc.is_empty() {
                lines.extend(desc.lines().map(str::to_string));
            }
            lines.push(DESCRIPTION_END.to_string());
        }

        for (key, value) in &section.fields {
            if key == DESCRIPTION_FIELD {
                continue;
            }
            let mut line = format!("{}: {}", key, value);
            if let Some(comment) = field_comment(section.object, key, format) {
                line.push_str("  # ");
                line.push_str(&comment);
            }
            lines.push(line);
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Fetch and render the extended document for the flagged objects
pub fn render_extended(
    targets: &[ExtendedTarget],
    client: &dyn BoardClient,
    format: DateFormat,
) -> Result<String, RemoteError> {
    let sections = load_sections(targets, client, format)?;
    Ok(render_sections(&sections, format))
}
