use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::board::{Board, BoardPrefs, Card, Label, List};
use crate::model::extended::ObjectType;
use crate::remote::{
    BoardClient, BoardUpdate, CardUpdate, LabelUpdate, ListUpdate, NewCard, NewList, RemoteError,
};

/// A board service kept entirely in memory, serializable to JSON.
///
/// A position sent by a client is an absolute sort key: the entity's `pos`
/// is set to it and open siblings are kept ordered by `pos`. An entity that
/// lands on a key already taken goes before the holder when it moves up or
/// arrives, after it when it moves down. Fetches report `pos` as the index
/// among open siblings, and [`LocalBoardStore::compact_positions`] rewrites
/// the stored keys to those indices. Archived lists are retained but never
/// returned by `fetch_lists`; closed cards are skipped by `fetch_cards`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalBoardStore {
    #[serde(default)]
    boards: Vec<StoredBoard>,
    #[serde(default)]
    next_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredBoard {
    board: Board,
    #[serde(default)]
    lists: Vec<StoredList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredList {
    list: List,
    #[serde(default)]
    cards: Vec<Card>,
}

impl LocalBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty board and return its ID
    pub fn add_board(&mut self, name: &str) -> String {
        let id = self.mint_id();
        self.boards.push(StoredBoard {
            board: Board {
                id: id.clone(),
                name: name.to_string(),
                desc: String::new(),
                closed: false,
                prefs: BoardPrefs::default(),
                labels: Vec::new(),
            },
            lists: Vec::new(),
        });
        id
    }

    /// Renumber the keys of open lists and cards to their index among open
    /// siblings. Closed entities keep their key and are ignored for ordering.
    pub fn compact_positions(&mut self) {
        for stored in &mut self.boards {
            for (i, l) in stored.lists.iter_mut().filter(|l| !l.list.closed).enumerate() {
                l.list.pos = i as f64;
            }
            for stored_list in &mut stored.lists {
                for (i, card) in stored_list.cards.iter_mut().filter(|c| !c.closed).enumerate() {
                    card.pos = i as f64;
                }
            }
        }
    }

    pub fn board_ids(&self) -> Vec<&str> {
        self.boards.iter().map(|b| b.board.id.as_str()).collect()
    }

    /// Remote IDs look like 24 hex digits; minted sequentially so tests are
    /// deterministic.
    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }

    // -----------------------------------------------------------------------
    // Lookup helpers
    // -----------------------------------------------------------------------

    fn board_ref(&self, board_id: &str) -> Result<&StoredBoard, RemoteError> {
        self.boards
            .iter()
            .find(|b| b.board.id == board_id)
            .ok_or_else(|| RemoteError::not_found("board", board_id))
    }

    fn board_mut(&mut self, board_id: &str) -> Result<&mut StoredBoard, RemoteError> {
        self.boards
            .iter_mut()
            .find(|b| b.board.id == board_id)
            .ok_or_else(|| RemoteError::not_found("board", board_id))
    }

    /// (board index, list index)
    fn locate_list(&self, list_id: &str) -> Result<(usize, usize), RemoteError> {
        for (bi, stored) in self.boards.iter().enumerate() {
            if let Some(li) = stored.lists.iter().position(|l| l.list.id == list_id) {
                return Ok((bi, li));
            }
        }
        Err(RemoteError::not_found("list", list_id))
    }

    /// (board index, list index, card index)
    fn locate_card(&self, card_id: &str) -> Result<(usize, usize, usize), RemoteError> {
        for (bi, stored) in self.boards.iter().enumerate() {
            for (li, stored_list) in stored.lists.iter().enumerate() {
                if let Some(ci) = stored_list.cards.iter().position(|c| c.id == card_id) {
                    return Ok((bi, li, ci));
                }
            }
        }
        Err(RemoteError::not_found("card", card_id))
    }

    fn locate_label(&self, label_id: &str) -> Result<(usize, usize), RemoteError> {
        for (bi, stored) in self.boards.iter().enumerate() {
            if let Some(li) = stored.board.labels.iter().position(|l| l.id == label_id) {
                return Ok((bi, li));
            }
        }
        Err(RemoteError::not_found("label", label_id))
    }

    fn card_mut(&mut self, card_id: &str) -> Result<&mut Card, RemoteError> {
        let (bi, li, ci) = self.locate_card(card_id)?;
        Ok(&mut self.boards[bi].lists[li].cards[ci])
    }

    /// Apply `edit` to every copy of a label carried by the board's cards
    fn for_each_card_label(stored: &mut StoredBoard, label_id: &str, edit: impl Fn(&mut Label)) {
        for stored_list in &mut stored.lists {
            for card in &mut stored_list.cards {
                for label in card.labels.iter_mut().filter(|l| l.id == label_id) {
                    edit(label);
                }
            }
        }
    }

    fn reposition_list(&mut self, list_id: &str, key: f64) -> Result<(), RemoteError> {
        let (bi, li) = self.locate_list(list_id)?;
        let lists = &mut self.boards[bi].lists;
        let old = lists[li].list.pos;
        if old == key {
            return Ok(());
        }
        let mut moving = lists.remove(li);
        moving.list.pos = key;
        let index = sorted_slot(lists.as_slice(), key, key < old, |l| (!l.list.closed).then_some(l.list.pos));
        lists.insert(index, moving);
        Ok(())
    }

    /// Give a card the sort key `key` in `list_id` (which may be its current
    /// list)
    fn place_card(&mut self, card_id: &str, list_id: &str, key: f64) -> Result<(), RemoteError> {
        // Validate the destination before detaching the card
        let (dest_bi, _) = self.locate_list(list_id)?;
        let (bi, li, ci) = self.locate_card(card_id)?;
        if dest_bi != bi {
            return Err(RemoteError::bad_request(format!(
                "card {} cannot move to list {} on another board",
                card_id, list_id
            )));
        }
        let same_list = self.boards[bi].lists[li].list.id == list_id;
        let old = self.boards[bi].lists[li].cards[ci].pos;
        if same_list && old == key {
            return Ok(());
        }
        let mut card = self.boards[bi].lists[li].cards.remove(ci);
        card.id_list = list_id.to_string();
        card.pos = key;
        let (_, dest_li) = self.locate_list(list_id)?;
        let cards = &mut self.boards[bi].lists[dest_li].cards;
        let index = sorted_slot(cards.as_slice(), key, !same_list || key < old, open_card_key);
        cards.insert(index, card);
        Ok(())
    }

    fn snapshot_card(&self, card_id: &str) -> Result<Card, RemoteError> {
        let (bi, li, ci) = self.locate_card(card_id)?;
        let cards = &self.boards[bi].lists[li].cards;
        let mut card = cards[ci].clone();
        card.pos = cards[..ci].iter().filter(|c| !c.closed).count() as f64;
        Ok(card)
    }

    fn snapshot_list(&self, list_id: &str) -> Result<List, RemoteError> {
        let (bi, li) = self.locate_list(list_id)?;
        let lists = &self.boards[bi].lists;
        let mut list = lists[li].list.clone();
        list.pos = lists[..li].iter().filter(|l| !l.list.closed).count() as f64;
        Ok(list)
    }

    // -----------------------------------------------------------------------
    // Bulk field updates
    // -----------------------------------------------------------------------

    fn bulk_update_board(
        &mut self,
        board_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let board = &mut self.board_mut(board_id)?.board;
        for (key, value) in fields {
            match key.as_str() {
                "name" => board.name = require_str(key, value)?,
                "desc" => board.desc = optional_str(key, value)?.unwrap_or_default(),
                "closed" => board.closed = require_bool(key, value)?,
                "prefs/permissionLevel" => board.prefs.permission_level = require_str(key, value)?,
                "prefs/selfJoin" => board.prefs.self_join = require_bool(key, value)?,
                "prefs/cardCovers" => board.prefs.card_covers = require_bool(key, value)?,
                "prefs/hideVotes" => board.prefs.hide_votes = require_bool(key, value)?,
                "prefs/invitations" => board.prefs.invitations = require_str(key, value)?,
                "prefs/voting" => board.prefs.voting = require_str(key, value)?,
                "prefs/comments" => board.prefs.comments = require_str(key, value)?,
                "prefs/cardAging" => board.prefs.card_aging = require_str(key, value)?,
                "prefs/calendarFeedEnabled" => {
                    board.prefs.calendar_feed_enabled = require_bool(key, value)?
                }
                _ => return Err(unknown_field("board", key)),
            }
        }
        Ok(())
    }

    fn bulk_update_list(
        &mut self,
        list_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        for (key, value) in fields {
            match key.as_str() {
                "pos" => {
                    let position = require_position(key, value)?;
                    self.reposition_list(list_id, position as f64)?;
                }
                _ => {
                    let (bi, li) = self.locate_list(list_id)?;
                    let list = &mut self.boards[bi].lists[li].list;
                    match key.as_str() {
                        "name" => list.name = require_str(key, value)?,
                        "closed" => list.closed = require_bool(key, value)?,
                        "subscribed" => list.subscribed = require_bool(key, value)?,
                        _ => return Err(unknown_field("list", key)),
                    }
                }
            }
        }
        Ok(())
    }

    fn bulk_update_card(
        &mut self,
        card_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        for (key, value) in fields {
            if key == "pos" {
                let position = require_position(key, value)?;
                let (bi, li, _) = self.locate_card(card_id)?;
                let list_id = self.boards[bi].lists[li].list.id.clone();
                self.place_card(card_id, &list_id, position as f64)?;
                continue;
            }
            let card = self.card_mut(card_id)?;
            match key.as_str() {
                "name" => card.name = require_str(key, value)?,
                "desc" => card.desc = optional_str(key, value)?.unwrap_or_default(),
                "closed" => card.closed = require_bool(key, value)?,
                "subscribed" => card.subscribed = require_bool(key, value)?,
                "start" => card.start = optional_str(key, value)?,
                "due" => card.due = optional_str(key, value)?,
                "dueComplete" => card.due_complete = require_bool(key, value)?,
                _ => return Err(unknown_field("card", key)),
            }
        }
        Ok(())
    }
}

/// Vec index at which an entity keyed `key` keeps `items` ordered. `key_of`
/// yields `None` for closed entities, which never decide the slot. Ties go
/// before the holder when `before_ties`, after it otherwise.
fn sorted_slot<T>(
    items: &[T],
    key: f64,
    before_ties: bool,
    key_of: impl Fn(&T) -> Option<f64>,
) -> usize {
    items
        .iter()
        .position(|item| match key_of(item) {
            Some(k) if before_ties => k >= key,
            Some(k) => k > key,
            None => false,
        })
        .unwrap_or(items.len())
}

fn open_card_key(card: &Card) -> Option<f64> {
    (!card.closed).then_some(card.pos)
}

fn unknown_field(kind: &str, key: &str) -> RemoteError {
    RemoteError::bad_request(format!("unknown {} field '{}'", kind, key))
}

fn require_str(key: &str, value: &Value) -> Result<String, RemoteError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RemoteError::bad_request(format!("field '{}' expects a string", key)))
}

fn optional_str(key: &str, value: &Value) -> Result<Option<String>, RemoteError> {
    if value.is_null() {
        Ok(None)
    } else {
        require_str(key, value).map(Some)
    }
}

fn require_bool(key: &str, value: &Value) -> Result<bool, RemoteError> {
    value
        .as_bool()
        .ok_or_else(|| RemoteError::bad_request(format!("field '{}' expects true or false", key)))
}

fn require_position(key: &str, value: &Value) -> Result<usize, RemoteError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(p) if p >= 0.0 => Ok(p as usize),
        _ => Err(RemoteError::bad_request(format!(
            "field '{}' expects a non-negative position",
            key
        ))),
    }
}

impl BoardClient for LocalBoardStore {
    fn fetch_board(&self, board_id: &str) -> Result<Board, RemoteError> {
        Ok(self.board_ref(board_id)?.board.clone())
    }

    fn fetch_lists(&self, board_id: &str) -> Result<Vec<List>, RemoteError> {
        let stored = self.board_ref(board_id)?;
        Ok(stored
            .lists
            .iter()
            .filter(|l| !l.list.closed)
            .enumerate()
            .map(|(i, l)| List {
                pos: i as f64,
                ..l.list.clone()
            })
            .collect())
    }

    fn fetch_cards(&self, list_id: &str) -> Result<Vec<Card>, RemoteError> {
        let (bi, li) = self.locate_list(list_id)?;
        Ok(self.boards[bi].lists[li]
            .cards
            .iter()
            .filter(|c| !c.closed)
            .enumerate()
            .map(|(i, c)| Card {
                pos: i as f64,
                ..c.clone()
            })
            .collect())
    }

    fn fetch_list(&self, list_id: &str) -> Result<List, RemoteError> {
        self.snapshot_list(list_id)
    }

    fn fetch_card(&self, card_id: &str) -> Result<Card, RemoteError> {
        self.snapshot_card(card_id)
    }

    fn update_board(
        &mut self,
        board_id: &str,
        update: &BoardUpdate,
    ) -> Result<Board, RemoteError> {
        let board = &mut self.board_mut(board_id)?.board;
        if let Some(ref name) = update.name {
            board.name = name.clone();
        }
        Ok(board.clone())
    }

    fn create_label(
        &mut self,
        board_id: &str,
        name: &str,
        color: &str,
    ) -> Result<Label, RemoteError> {
        self.board_ref(board_id)?;
        let label = Label {
            id: self.mint_id(),
            name: name.to_string(),
            color: color.to_string(),
        };
        self.board_mut(board_id)?.board.labels.push(label.clone());
        Ok(label)
    }

    fn update_label(
        &mut self,
        label_id: &str,
        update: &LabelUpdate,
    ) -> Result<Label, RemoteError> {
        let (bi, li) = self.locate_label(label_id)?;
        let stored = &mut self.boards[bi];
        let label = &mut stored.board.labels[li];
        if let Some(ref name) = update.name {
            label.name = name.clone();
        }
        if let Some(ref color) = update.color {
            label.color = color.clone();
        }
        let updated = label.clone();
        Self::for_each_card_label(stored, label_id, |l| *l = updated.clone());
        Ok(updated)
    }

    fn delete_label(&mut self, label_id: &str) -> Result<(), RemoteError> {
        let (bi, li) = self.locate_label(label_id)?;
        let stored = &mut self.boards[bi];
        stored.board.labels.remove(li);
        for stored_list in &mut stored.lists {
            for card in &mut stored_list.cards {
                card.labels.retain(|l| l.id != label_id);
            }
        }
        Ok(())
    }

    fn create_list(&mut self, new_list: &NewList) -> Result<List, RemoteError> {
        self.board_ref(&new_list.board_id)?;
        let list = List {
            id: self.mint_id(),
            id_board: new_list.board_id.clone(),
            name: new_list.name.clone(),
            closed: false,
            pos: new_list.position as f64,
            subscribed: false,
        };
        let lists = &mut self.board_mut(&new_list.board_id)?.lists;
        let index = sorted_slot(lists.as_slice(), list.pos, true, |l| {
            (!l.list.closed).then_some(l.list.pos)
        });
        lists.insert(
            index,
            StoredList {
                list: list.clone(),
                cards: Vec::new(),
            },
        );
        self.snapshot_list(&list.id)
    }

    fn update_list(&mut self, list_id: &str, update: &ListUpdate) -> Result<List, RemoteError> {
        let (bi, li) = self.locate_list(list_id)?;
        if let Some(ref name) = update.name {
            self.boards[bi].lists[li].list.name = name.clone();
        }
        if let Some(position) = update.position {
            self.reposition_list(list_id, position as f64)?;
        }
        self.snapshot_list(list_id)
    }

    fn archive_list(&mut self, list_id: &str) -> Result<List, RemoteError> {
        let (bi, li) = self.locate_list(list_id)?;
        self.boards[bi].lists[li].list.closed = true;
        self.snapshot_list(list_id)
    }

    fn create_card(&mut self, new_card: &NewCard) -> Result<Card, RemoteError> {
        let (bi, li) = self.locate_list(&new_card.list_id)?;
        let card = Card {
            id: self.mint_id(),
            id_list: new_card.list_id.clone(),
            name: new_card.name.clone(),
            desc: String::new(),
            closed: false,
            pos: new_card.position as f64,
            due: None,
            start: None,
            due_complete: new_card.due_complete,
            labels: Vec::new(),
            subscribed: false,
        };
        let cards = &mut self.boards[bi].lists[li].cards;
        let index = sorted_slot(cards.as_slice(), card.pos, true, open_card_key);
        cards.insert(index, card.clone());
        self.snapshot_card(&card.id)
    }

    fn update_card(&mut self, card_id: &str, update: &CardUpdate) -> Result<Card, RemoteError> {
        {
            let card = self.card_mut(card_id)?;
            if let Some(ref name) = update.name {
                card.name = name.clone();
            }
            if let Some(complete) = update.due_complete {
                card.due_complete = complete;
            }
            if let Some(ref due) = update.due {
                card.due = due.clone();
            }
        }
        if update.list_id.is_some() || update.position.is_some() {
            let (bi, li, ci) = self.locate_card(card_id)?;
            let current_list = self.boards[bi].lists[li].list.id.clone();
            let list_id = update.list_id.clone().unwrap_or(current_list);
            let key = match update.position {
                Some(position) => position as f64,
                None => self.boards[bi].lists[li].cards[ci].pos,
            };
            self.place_card(card_id, &list_id, key)?;
        }
        self.snapshot_card(card_id)
    }

    fn add_card_label(&mut self, card_id: &str, label_id: &str) -> Result<(), RemoteError> {
        let (bi, _) = self.locate_label(label_id)?;
        let label = self.boards[bi]
            .board
            .labels
            .iter()
            .find(|l| l.id == label_id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("label", label_id))?;
        let card = self.card_mut(card_id)?;
        if card.labels.iter().any(|l| l.id == label_id) {
            return Err(RemoteError::bad_request(format!(
                "label {} is already on card {}",
                label_id, card_id
            )));
        }
        card.labels.push(label);
        Ok(())
    }

    fn remove_card_label(&mut self, card_id: &str, label_id: &str) -> Result<(), RemoteError> {
        let card = self.card_mut(card_id)?;
        let before = card.labels.len();
        card.labels.retain(|l| l.id != label_id);
        if card.labels.len() == before {
            return Err(RemoteError::not_found("card label", label_id));
        }
        Ok(())
    }

    fn delete_card(&mut self, card_id: &str) -> Result<(), RemoteError> {
        let (bi, li, ci) = self.locate_card(card_id)?;
        self.boards[bi].lists[li].cards.remove(ci);
        Ok(())
    }

    fn bulk_update(
        &mut self,
        object: ObjectType,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        match object {
            ObjectType::Board => self.bulk_update_board(id, fields),
            ObjectType::List => self.bulk_update_list(id, fields),
            ObjectType::Card => self.bulk_update_card(id, fields),
        }
    }
}
