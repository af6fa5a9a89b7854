use tracing::warn;

use crate::model::action::NO_COLOUR;
use crate::model::board::FetchedBoard;
use crate::model::config::DateFormat;
use crate::model::snapshot::{ParsedBoard, ParsedCard, ParsedLabel, ParsedList};
use crate::parse::dates::remote_to_display;
use crate::parse::ids::IdMapper;
use crate::parse::line;

/// Build the snapshot a fetched board renders to.
///
/// Everything the text format cannot carry is dropped here, so that parsing
/// the rendered document gives back exactly this snapshot: labels without a
/// name are omitted (from the label block and from cards), labels without a
/// colour get [`NO_COLOUR`], unreadable due dates are treated as absent, and
/// runs of whitespace in names (newlines included) become a single space.
pub fn snapshot_from_remote(fetched: &FetchedBoard, format: DateFormat) -> ParsedBoard {
    let labels = fetched
        .board
        .labels
        .iter()
        .filter(|l| !l.name.trim().is_empty())
        .map(|l| ParsedLabel {
            id: l.id.clone(),
            name: single_line(&l.name),
            colour: if l.color.is_empty() {
                NO_COLOUR.to_string()
            } else {
                l.color.clone()
            },
        })
        .collect();

    let lists = fetched
        .lists
        .iter()
        .enumerate()
        .map(|(render_index, f)| ParsedList {
            id: f.list.id.clone(),
            name: single_line(&f.list.name),
            render_index,
            cards: f
                .cards
                .iter()
                .enumerate()
                .map(|(position, card)| ParsedCard {
                    id: card.id.clone(),
                    list_id: f.list.id.clone(),
                    name: single_line(&card.name),
                    position,
                    checkbox: if card.due_complete { 'x' } else { ' ' },
                    labels: card
                        .labels
                        .iter()
                        .filter(|l| !l.name.trim().is_empty())
                        .map(|l| single_line(&l.name))
                        .collect(),
                    due: card.due.as_deref().and_then(|due| {
                        let display = remote_to_display(due, format);
                        if display.is_none() {
                            warn!(card = %card.id, due, "ignoring unreadable due date");
                        }
                        display
                    }),
                    extended: false,
                })
                .collect(),
            extended: false,
        })
        .collect();

    ParsedBoard {
        id: fetched.board.id.clone(),
        name: single_line(&fetched.board.name),
        labels,
        lists,
        extended: false,
    }
}

fn single_line(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a snapshot as a board document.
///
/// Entities with a short token in `mapper` carry it as `{token}`; entities
/// without one (placeholders) are written bare and read back as new.
pub fn render_board(board: &ParsedBoard, mapper: &IdMapper) -> String {
    let mut out = render_lines(board, mapper).join("\n");
    out.push('\n');
    out
}

pub fn render_lines(board: &ParsedBoard, mapper: &IdMapper) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "# {}{}",
        line::escape_heading(&board.name),
        suffix(&board.id, board.extended, mapper)
    ));

    for label in &board.labels {
        lines.push(format!(
            "@{}:{}{}",
            line::escape_label_name(&label.name),
            label.colour,
            suffix(&label.id, false, mapper)
        ));
    }

    for list in &board.lists {
        lines.push(String::new());
        lines.push(format!(
            "## {}{}",
            line::escape_heading(&list.name),
            suffix(&list.id, list.extended, mapper)
        ));
        for card in &list.cards {
            lines.push(render_card(card, mapper));
        }
    }
    lines
}

fn render_card(card: &ParsedCard, mapper: &IdMapper) -> String {
    let mut out = format!("- [{}] {}", card.checkbox, line::escape_card_name(&card.name));
    for label in &card.labels {
        out.push_str(" @");
        out.push_str(&line::escape_label_name(label));
    }
    if let Some(ref due) = card.due {
        out.push_str(" due:");
        out.push_str(due);
    }
    out.push_str(&suffix(&card.id, card.extended, mapper));
    out
}

/// ` {token}` plus the extended-edit marker
fn suffix(id: &str, extended: bool, mapper: &IdMapper) -> String {
    let mut s = match mapper.mapping(id) {
        Some(token) => format!(" {{{}}}", token),
        None => String::new(),
    };
    if extended {
        s.push_str(" !");
    }
    s
}
