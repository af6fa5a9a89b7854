use serde::{Deserialize, Serialize};

/// A board label as the remote system stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    /// Labels may be colour-only, in which case the name is empty
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Board-level preferences exposed through the extended editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardPrefs {
    pub permission_level: String,
    pub self_join: bool,
    pub card_covers: bool,
    pub hide_votes: bool,
    pub invitations: String,
    pub voting: String,
    pub comments: String,
    pub card_aging: String,
    pub calendar_feed_enabled: bool,
}

impl Default for BoardPrefs {
    fn default() -> Self {
        BoardPrefs {
            permission_level: "private".to_string(),
            self_join: true,
            card_covers: true,
            hide_votes: false,
            invitations: "members".to_string(),
            voting: "disabled".to_string(),
            comments: "members".to_string(),
            card_aging: "regular".to_string(),
            calendar_feed_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub prefs: BoardPrefs,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub id_board: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub pos: f64,
    #[serde(default)]
    pub subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub id_list: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub pos: f64,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub due: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub due_complete: bool,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub subscribed: bool,
}

/// One board with its open lists and their cards, as fetched for a session
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBoard {
    pub board: Board,
    pub lists: Vec<FetchedList>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedList {
    pub list: List,
    pub cards: Vec<Card>,
}

impl FetchedBoard {
    /// Every canonical ID on the board: board, labels, lists, cards
    pub fn canonical_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.board.id.as_str()];
        ids.extend(self.board.labels.iter().map(|l| l.id.as_str()));
        for fetched in &self.lists {
            ids.push(fetched.list.id.as_str());
            ids.extend(fetched.cards.iter().map(|c| c.id.as_str()));
        }
        ids
    }
}
