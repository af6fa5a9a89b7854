use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::extended::{FieldChange, ObjectType};
use crate::parse::ids::is_placeholder;
use crate::remote::{
    BoardClient, BoardUpdate, CardUpdate, LabelUpdate, ListUpdate, NewCard, NewList, RemoteError,
};

/// Colour written in the document for labels without one
pub const NO_COLOUR: &str = "none";

/// One remote mutation produced by the reconciler.
///
/// Each variant carries the identifiers needed to perform the mutation plus
/// the before/after values needed to describe it. IDs may be placeholders
/// for entities created earlier in the same batch; [`ApplyContext`] rewrites
/// them to the real IDs at apply time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RenameBoard {
        board_id: String,
        old_name: String,
        new_name: String,
    },
    CreateLabel {
        label_id: String,
        name: String,
        colour: String,
    },
    RenameLabel {
        label_id: String,
        old_name: String,
        new_name: String,
    },
    RecolourLabel {
        label_id: String,
        name: String,
        old_colour: String,
        new_colour: String,
    },
    DeleteLabel {
        label_id: String,
        name: String,
    },
    CreateList {
        list_id: String,
        name: String,
        position: usize,
    },
    RenameList {
        list_id: String,
        old_name: String,
        new_name: String,
    },
    RepositionList {
        list_id: String,
        name: String,
        old_position: usize,
        new_position: usize,
    },
    ArchiveList {
        list_id: String,
        name: String,
    },
    CreateCard {
        card_id: String,
        list_id: String,
        list_name: String,
        name: String,
        position: usize,
        complete: bool,
    },
    RenameCard {
        card_id: String,
        old_name: String,
        new_name: String,
    },
    RepositionCard {
        card_id: String,
        name: String,
        old_position: usize,
        new_position: usize,
    },
    MoveCard {
        card_id: String,
        name: String,
        from_list: String,
        from_list_name: String,
        to_list: String,
        to_list_name: String,
        position: usize,
    },
    SetCardComplete {
        card_id: String,
        name: String,
        complete: bool,
    },
    AddCardLabel {
        card_id: String,
        card_name: String,
        label_id: String,
        label_name: String,
    },
    RemoveCardLabel {
        card_id: String,
        card_name: String,
        label_id: String,
        label_name: String,
    },
    SetCardDue {
        card_id: String,
        name: String,
        /// Remote timestamp
        due: String,
        /// As written in the document
        display: String,
    },
    ClearCardDue {
        card_id: String,
        name: String,
    },
    DeleteCard {
        card_id: String,
        name: String,
    },
    /// Several extended fields of one object, applied in one call
    BulkUpdate {
        object: ObjectType,
        object_id: String,
        object_name: String,
        fields: Map<String, Value>,
        changes: Vec<FieldChange>,
    },
}

/// Execution phase. Actions are applied phase by phase, in this order, so
/// that lists and labels exist before cards refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BoardAndLabels,
    Lists,
    ListPositions,
    Cards,
}

/// State carried across one batch of applied actions
#[derive(Debug, Clone, Default)]
pub struct ApplyContext {
    pub board_id: String,
    /// Placeholder ID -> real ID, filled in by create actions
    resolved: HashMap<String, String>,
}

impl ApplyContext {
    pub fn new(board_id: &str) -> Self {
        ApplyContext {
            board_id: board_id.to_string(),
            resolved: HashMap::new(),
        }
    }

    /// Real ID for `id`. Placeholders must have been created earlier in the
    /// batch.
    pub fn resolve(&self, id: &str) -> Result<String, RemoteError> {
        if !is_placeholder(id) {
            return Ok(id.to_string());
        }
        self.resolved
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("entity created in this batch", id))
    }

    pub fn record(&mut self, placeholder: &str, real: &str) {
        self.resolved
            .insert(placeholder.to_string(), real.to_string());
    }

    pub fn created(&self) -> &HashMap<String, String> {
        &self.resolved
    }
}

fn remote_colour(colour: &str) -> &str {
    if colour == NO_COLOUR { "" } else { colour }
}

impl Action {
    pub fn phase(&self) -> Phase {
        match self {
            Action::RenameBoard { .. }
            | Action::CreateLabel { .. }
            | Action::RenameLabel { .. }
            | Action::RecolourLabel { .. }
            | Action::DeleteLabel { .. } => Phase::BoardAndLabels,
            Action::CreateList { .. } | Action::RenameList { .. } | Action::ArchiveList { .. } => {
                Phase::Lists
            }
            Action::RepositionList { .. } => Phase::ListPositions,
            Action::CreateCard { .. }
            | Action::RenameCard { .. }
            | Action::RepositionCard { .. }
            | Action::MoveCard { .. }
            | Action::SetCardComplete { .. }
            | Action::AddCardLabel { .. }
            | Action::RemoveCardLabel { .. }
            | Action::SetCardDue { .. }
            | Action::ClearCardDue { .. }
            | Action::DeleteCard { .. }
            | Action::BulkUpdate { .. } => Phase::Cards,
        }
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        match self {
            Action::RenameBoard {
                old_name, new_name, ..
            } => format!("Renamed board \"{}\" to \"{}\"", old_name, new_name),
            Action::CreateLabel { name, colour, .. } => {
                format!("Created label \"{}\" with colour \"{}\"", name, colour)
            }
            Action::RenameLabel {
                old_name, new_name, ..
            } => format!("Renamed label \"{}\" to \"{}\"", old_name, new_name),
            Action::RecolourLabel {
                name,
                old_colour,
                new_colour,
                ..
            } => format!(
                "Changed colour of label \"{}\" from \"{}\" to \"{}\"",
                name, old_colour, new_colour
            ),
            Action::DeleteLabel { name, .. } => format!("Deleted label \"{}\"", name),
            Action::CreateList { name, position, .. } => {
                format!("Created list \"{}\" at position {}", name, position)
            }
            Action::RenameList {
                old_name, new_name, ..
            } => format!("Renamed list \"{}\" to \"{}\"", old_name, new_name),
            Action::RepositionList {
                name,
                old_position,
                new_position,
                ..
            } => format!(
                "Moved list \"{}\" from position {} to {}",
                name, old_position, new_position
            ),
            Action::ArchiveList { name, .. } => format!("Archived list \"{}\"", name),
            Action::CreateCard {
                name,
                list_name,
                position,
                ..
            } => format!(
                "Created card \"{}\" in list \"{}\" at position {}",
                name, list_name, position
            ),
            Action::RenameCard {
                old_name, new_name, ..
            } => format!("Renamed card \"{}\" to \"{}\"", old_name, new_name),
            Action::RepositionCard {
                name,
                old_position,
                new_position,
                ..
            } => format!(
                "Moved card \"{}\" from position {} to {}",
                name, old_position, new_position
            ),
            Action::MoveCard {
                name,
                from_list_name,
                to_list_name,
                position,
                ..
            } => format!(
                "Moved card \"{}\" from list \"{}\" to list \"{}\" at position {}",
                name, from_list_name, to_list_name, position
            ),
            Action::SetCardComplete { name, complete, .. } => {
                if *complete {
                    format!("Marked card \"{}\" complete", name)
                } else {
                    format!("Marked card \"{}\" incomplete", name)
                }
            }
            Action::AddCardLabel {
                card_name,
                label_name,
                ..
            } => format!("Added label \"{}\" to card \"{}\"", label_name, card_name),
            Action::RemoveCardLabel {
                card_name,
                label_name,
                ..
            } => format!(
                "Removed label \"{}\" from card \"{}\"",
                label_name, card_name
            ),
            Action::SetCardDue { name, display, .. } => {
                format!("Set due date of card \"{}\" to {}", name, display)
            }
            Action::ClearCardDue { name, .. } => format!("Cleared due date of card \"{}\"", name),
            Action::DeleteCard { name, .. } => format!("Deleted card \"{}\"", name),
            Action::BulkUpdate {
                object,
                object_name,
                changes,
                ..
            } => {
                let fields: Vec<String> = changes
                    .iter()
                    .map(|c| format!("{} \"{}\" -> \"{}\"", c.field, c.old, c.new))
                    .collect();
                format!("Updated {} \"{}\": {}", object, object_name, fields.join(", "))
            }
        }
    }

    /// Perform the mutation against the remote service
    pub fn apply(
        &self,
        client: &mut dyn BoardClient,
        ctx: &mut ApplyContext,
    ) -> Result<(), RemoteError> {
        match self {
            Action::RenameBoard {
                board_id, new_name, ..
            } => {
                let update = BoardUpdate {
                    name: Some(new_name.clone()),
                };
                client.update_board(board_id, &update)?;
            }
            Action::CreateLabel {
                label_id,
                name,
                colour,
            } => {
                let board_id = ctx.board_id.clone();
                let label = client.create_label(&board_id, name, remote_colour(colour))?;
                ctx.record(label_id, &label.id);
            }
            Action::RenameLabel {
                label_id, new_name, ..
            } => {
                let update = LabelUpdate {
                    name: Some(new_name.clone()),
                    ..Default::default()
                };
                client.update_label(label_id, &update)?;
            }
            Action::RecolourLabel {
                label_id,
                new_colour,
                ..
            } => {
                let update = LabelUpdate {
                    color: Some(remote_colour(new_colour).to_string()),
                    ..Default::default()
                };
                client.update_label(label_id, &update)?;
            }
            Action::DeleteLabel { label_id, .. } => client.delete_label(label_id)?,
            Action::CreateList {
                list_id,
                name,
                position,
            } => {
                let new_list = NewList {
                    board_id: ctx.board_id.clone(),
                    name: name.clone(),
                    position: *position,
                };
                let list = client.create_list(&new_list)?;
                ctx.record(list_id, &list.id);
            }
            Action::RenameList {
                list_id, new_name, ..
            } => {
                let update = ListUpdate {
                    name: Some(new_name.clone()),
                    ..Default::default()
                };
                client.update_list(list_id, &update)?;
            }
            Action::RepositionList {
                list_id,
                new_position,
                ..
            } => {
                let update = ListUpdate {
                    position: Some(*new_position),
                    ..Default::default()
                };
                client.update_list(&ctx.resolve(list_id)?, &update)?;
            }
            Action::ArchiveList { list_id, .. } => {
                client.archive_list(list_id)?;
            }
            Action::CreateCard {
                card_id,
                list_id,
                name,
                position,
                complete,
                ..
            } => {
                let new_card = NewCard {
                    list_id: ctx.resolve(list_id)?,
                    name: name.clone(),
                    position: *position,
                    due_complete: *complete,
                };
                let card = client.create_card(&new_card)?;
                ctx.record(card_id, &card.id);
            }
            Action::RenameCard {
                card_id, new_name, ..
            } => {
                let update = CardUpdate {
                    name: Some(new_name.clone()),
                    ..Default::default()
                };
                client.update_card(card_id, &update)?;
            }
            Action::RepositionCard {
                card_id,
                new_position,
                ..
            } => {
                let update = CardUpdate {
                    position: Some(*new_position),
                    ..Default::default()
                };
                client.update_card(card_id, &update)?;
            }
            Action::MoveCard {
                card_id,
                to_list,
                position,
                ..
            } => {
                let update = CardUpdate {
                    list_id: Some(ctx.resolve(to_list)?),
                    position: Some(*position),
                    ..Default::default()
                };
                client.update_card(card_id, &update)?;
            }
            Action::SetCardComplete {
                card_id, complete, ..
            } => {
                let update = CardUpdate {
                    due_complete: Some(*complete),
                    ..Default::default()
                };
                client.update_card(&ctx.resolve(card_id)?, &update)?;
            }
            Action::AddCardLabel {
                card_id, label_id, ..
            } => {
                client.add_card_label(&ctx.resolve(card_id)?, &ctx.resolve(label_id)?)?;
            }
            Action::RemoveCardLabel {
                card_id, label_id, ..
            } => {
                client.remove_card_label(card_id, label_id)?;
            }
            Action::SetCardDue { card_id, due, .. } => {
                let update = CardUpdate {
                    due: Some(Some(due.clone())),
                    ..Default::default()
                };
                client.update_card(&ctx.resolve(card_id)?, &update)?;
            }
            Action::ClearCardDue { card_id, .. } => {
                let update = CardUpdate {
                    due: Some(None),
                    ..Default::default()
                };
                client.update_card(card_id, &update)?;
            }
            Action::DeleteCard { card_id, .. } => client.delete_card(card_id)?,
            Action::BulkUpdate {
                object,
                object_id,
                fields,
                ..
            } => {
                client.bulk_update(*object, &ctx.resolve(object_id)?, fields)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
