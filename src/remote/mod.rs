//! Boundary to the remote board service.
//!
//! The reconciliation pipeline only talks to the remote system through
//! [`BoardClient`]. The HTTP transport lives outside this crate; the
//! [`local::LocalBoardStore`] implementation keeps boards in a JSON file and
//! serves as the offline remote and as the test double.

pub mod local;

use serde_json::{Map, Value};

use crate::model::board::{Board, Card, FetchedBoard, FetchedList, Label, List};
use crate::model::extended::ObjectType;

pub use local::LocalBoardStore;

/// Error type for remote operations
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("remote API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode board data: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RemoteError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        RemoteError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        RemoteError::Api {
            status: 400,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub board_id: String,
    pub name: String,
    /// Target index among the board's open lists
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub list_id: String,
    pub name: String,
    /// Target index within the list
    pub position: usize,
    pub due_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub name: Option<String>,
    /// Move to another list
    pub list_id: Option<String>,
    pub position: Option<usize>,
    pub due_complete: Option<bool>,
    /// `Some(None)` clears the due date
    pub due: Option<Option<String>>,
}

/// Operations the reconciliation pipeline needs from the remote service
pub trait BoardClient {
    fn fetch_board(&self, board_id: &str) -> Result<Board, RemoteError>;
    /// Open lists of a board, in board order
    fn fetch_lists(&self, board_id: &str) -> Result<Vec<List>, RemoteError>;
    /// Cards of a list, in list order
    fn fetch_cards(&self, list_id: &str) -> Result<Vec<Card>, RemoteError>;
    fn fetch_list(&self, list_id: &str) -> Result<List, RemoteError>;
    fn fetch_card(&self, card_id: &str) -> Result<Card, RemoteError>;

    fn update_board(&mut self, board_id: &str, update: &BoardUpdate)
    -> Result<Board, RemoteError>;

    fn create_label(&mut self, board_id: &str, name: &str, color: &str)
    -> Result<Label, RemoteError>;
    fn update_label(&mut self, label_id: &str, update: &LabelUpdate)
    -> Result<Label, RemoteError>;
    fn delete_label(&mut self, label_id: &str) -> Result<(), RemoteError>;

    fn create_list(&mut self, new_list: &NewList) -> Result<List, RemoteError>;
    fn update_list(&mut self, list_id: &str, update: &ListUpdate) -> Result<List, RemoteError>;
    fn archive_list(&mut self, list_id: &str) -> Result<List, RemoteError>;

    fn create_card(&mut self, new_card: &NewCard) -> Result<Card, RemoteError>;
    fn update_card(&mut self, card_id: &str, update: &CardUpdate) -> Result<Card, RemoteError>;
    fn add_card_label(&mut self, card_id: &str, label_id: &str) -> Result<(), RemoteError>;
    fn remove_card_label(&mut self, card_id: &str, label_id: &str) -> Result<(), RemoteError>;
    fn delete_card(&mut self, card_id: &str) -> Result<(), RemoteError>;

    /// Set several remote fields on one object at once. Keys are remote API
    /// field names (`desc`, `prefs/voting`, `dueComplete`, ...).
    fn bulk_update(
        &mut self,
        object: ObjectType,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError>;
}

/// Fetch a board with all its open lists and their cards
pub fn fetch_board_tree(
    client: &dyn BoardClient,
    board_id: &str,
) -> Result<FetchedBoard, RemoteError> {
    let board = client.fetch_board(board_id)?;
    let mut lists = Vec::new();
    for list in client.fetch_lists(board_id)? {
        let cards = client.fetch_cards(&list.id)?;
        lists.push(FetchedList { list, cards });
    }
    Ok(FetchedBoard { board, lists })
}
