use std::collections::HashSet;

use tracing::debug;

use crate::model::snapshot::{ParsedBoard, ParsedCard, ParsedLabel, ParsedList};
use crate::parse::ids::{IdError, IdMapper, is_placeholder};
use crate::parse::line::{self, FieldError, LineKind};

/// A document that could not be parsed. No partial snapshot is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected content: {0}")]
    UnexpectedContent(String),
    #[error("card appears before any list")]
    CardBeforeList,
    #[error("invalid label '{0}': label names use ~ in place of spaces")]
    InvalidLabelFormat(String),
    #[error("malformed {field}: {detail}")]
    MalformedLine { field: &'static str, detail: String },
    #[error(transparent)]
    Unresolved(#[from] IdError),
    #[error("duplicate label name '{0}'")]
    DuplicateLabel(String),
    #[error("ID {0} appears more than once")]
    DuplicateId(String),
    #[error("document has no board heading")]
    MissingBoardHeading,
}

impl From<FieldError> for ParseErrorKind {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::Malformed { field, detail } => ParseErrorKind::MalformedLine { field, detail },
            FieldError::LabelFormat(name) => ParseErrorKind::InvalidLabelFormat(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the board heading
    Preamble,
    /// After the board heading, before the first list
    Labels,
    /// Inside a list
    List,
}

struct Builder<'m> {
    mapper: &'m mut IdMapper,
    state: State,
    board: Option<(String, String, bool)>,
    labels: Vec<ParsedLabel>,
    lists: Vec<ParsedList>,
    seen_ids: HashSet<String>,
}

impl Builder<'_> {
    /// Resolve a token and reject real IDs already used in this document
    fn resolve(&mut self, token: &str) -> Result<String, ParseErrorKind> {
        let id = self.mapper.resolve(token)?;
        if !is_placeholder(&id) && !self.seen_ids.insert(id.clone()) {
            return Err(ParseErrorKind::DuplicateId(token.to_string()));
        }
        Ok(id)
    }

    fn line(&mut self, kind: LineKind<'_>, raw: &str) -> Result<(), ParseErrorKind> {
        match (self.state, kind) {
            (_, LineKind::Blank) => Ok(()),

            (State::Preamble, LineKind::BoardHeading(text)) => {
                let (name, token, extended) = line::parse_heading(text)?;
                let id = self.resolve(&token)?;
                self.board = Some((id, name, extended));
                self.state = State::Labels;
                Ok(())
            }
            (State::Preamble, LineKind::ListHeading(_)) => Err(ParseErrorKind::MissingBoardHeading),
            (State::Preamble | State::Labels, LineKind::Card(_)) => {
                Err(ParseErrorKind::CardBeforeList)
            }

            (State::Labels, LineKind::Label(text)) => {
                let label = line::parse_label_line(text)?;
                if self.labels.iter().any(|l| l.name == label.name) {
                    return Err(ParseErrorKind::DuplicateLabel(label.name));
                }
                let id = self.resolve(&label.token)?;
                self.labels.push(ParsedLabel {
                    id,
                    name: label.name,
                    colour: label.colour,
                });
                Ok(())
            }

            (State::Labels | State::List, LineKind::ListHeading(text)) => {
                let (name, token, extended) = line::parse_heading(text)?;
                let id = self.resolve(&token)?;
                let render_index = self.lists.len();
                self.lists.push(ParsedList {
                    id,
                    name,
                    render_index,
                    cards: Vec::new(),
                    extended,
                });
                self.state = State::List;
                Ok(())
            }

            (State::List, LineKind::Card(text)) => {
                let card = line::parse_card_line(text)?;
                let id = self.resolve(&card.token)?;
                let Some(list) = self.lists.last_mut() else {
                    return Err(ParseErrorKind::CardBeforeList);
                };
                list.cards.push(ParsedCard {
                    id,
                    list_id: list.id.clone(),
                    name: card.name,
                    position: list.cards.len(),
                    checkbox: card.checkbox,
                    labels: card.labels,
                    due: card.due,
                    extended: card.extended,
                });
                Ok(())
            }

            _ => Err(ParseErrorKind::UnexpectedContent(raw.trim().to_string())),
        }
    }
}

/// Parse a board document into a snapshot, resolving every `{token}`
/// through `mapper`. Lines without a token become new entities.
pub fn parse_board(text: &str, mapper: &mut IdMapper) -> Result<ParsedBoard, ParseError> {
    let mut builder = Builder {
        mapper,
        state: State::Preamble,
        board: None,
        labels: Vec::new(),
        lists: Vec::new(),
        seen_ids: HashSet::new(),
    };

    for (idx, raw) in text.lines().enumerate() {
        let kind = line::classify(raw);
        builder
            .line(kind, raw)
            .map_err(|kind| ParseError { line: idx + 1, kind })?;
    }

    let Some((id, name, extended)) = builder.board else {
        return Err(ParseError {
            line: text.lines().count().max(1),
            kind: ParseErrorKind::MissingBoardHeading,
        });
    };

    let board = ParsedBoard {
        id,
        name,
        labels: builder.labels,
        lists: builder.lists,
        extended,
    };
    debug!(
        board = %board.name,
        labels = board.labels.len(),
        lists = board.lists.len(),
        cards = board.cards().count(),
        "parsed board document"
    );
    Ok(board)
}
