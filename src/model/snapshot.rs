use serde::Serialize;

/// Character used in place of spaces inside label names in the text format
pub const LABEL_FILLER: char = '~';

/// A board label as it appears in the label block of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLabel {
    pub id: String,
    /// Display name with the filler character decoded back to spaces
    pub name: String,
    pub colour: String,
}

/// A board parsed from one text document at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedBoard {
    pub id: String,
    pub name: String,
    pub labels: Vec<ParsedLabel>,
    pub lists: Vec<ParsedList>,
    /// Heading carried a trailing `!`
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedList {
    pub id: String,
    pub name: String,
    /// Zero-based position among the lists in the document
    pub render_index: usize,
    pub cards: Vec<ParsedCard>,
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCard {
    pub id: String,
    pub list_id: String,
    pub name: String,
    /// Zero-based position within the owning list
    pub position: usize,
    /// Raw checkbox character (` `, `x` or `X`)
    pub checkbox: char,
    /// Label references by display name
    pub labels: Vec<String>,
    /// Due date in the configured human format
    pub due: Option<String>,
    pub extended: bool,
}

impl ParsedCard {
    pub fn is_complete(&self) -> bool {
        self.checkbox.eq_ignore_ascii_case(&'x')
    }
}

impl ParsedBoard {
    pub fn list(&self, id: &str) -> Option<&ParsedList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn label_by_name(&self, name: &str) -> Option<&ParsedLabel> {
        self.labels.iter().find(|l| l.name == name)
    }

    /// All cards across all lists, in document order
    pub fn cards(&self) -> impl Iterator<Item = &ParsedCard> {
        self.lists.iter().flat_map(|l| l.cards.iter())
    }
}

/// Encode a label name for the text format (spaces become the filler)
pub fn encode_label_name(name: &str) -> String {
    name.replace(' ', &LABEL_FILLER.to_string())
}

/// Decode a label name from the text format
pub fn decode_label_name(name: &str) -> String {
    name.replace(LABEL_FILLER, " ")
}
