use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::action::Action;
use crate::model::config::DateFormat;
use crate::model::extended::{ExtendedTarget, ObjectType};
use crate::model::snapshot::{ParsedBoard, ParsedCard, ParsedLabel, ParsedList};
use crate::parse::dates::display_to_remote;
use crate::parse::ids::is_placeholder;

/// The diff could not be computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("card \"{card}\" refers to unknown label \"{label}\"")]
    UnknownLabel { card: String, label: String },
    #[error("card \"{card}\" has an unreadable due date \"{value}\"")]
    InvalidDueDate { card: String, value: String },
}

/// Actions to apply plus the objects flagged for extended editing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub actions: Vec<Action>,
    pub extended: Vec<ExtendedTarget>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.extended.is_empty()
    }
}

struct Differ<'a> {
    before: &'a ParsedBoard,
    after: &'a ParsedBoard,
    format: DateFormat,
    /// Every card in `after`, with the list holding it
    after_cards: HashMap<&'a str, (&'a ParsedList, &'a ParsedCard)>,
    /// Every card ID in `before`
    before_cards: HashSet<&'a str>,
    out: DiffResult,
}

/// Compute the actions that turn the remote state matching `before` into
/// the state described by `after`.
///
/// Entities are matched by canonical ID; placeholder IDs are new. Actions
/// come out in document order: board, labels, then each list of `before`
/// with its cards, then lists that are new in `after`.
pub fn diff(
    before: &ParsedBoard,
    after: &ParsedBoard,
    format: DateFormat,
) -> Result<DiffResult, DiffError> {
    let mut differ = Differ {
        before,
        after,
        format,
        after_cards: after
            .lists
            .iter()
            .flat_map(|l| l.cards.iter().map(move |c| (c.id.as_str(), (l, c))))
            .collect(),
        before_cards: before.cards().map(|c| c.id.as_str()).collect(),
        out: DiffResult::default(),
    };
    differ.board();
    differ.labels();
    differ.lists()?;

    debug!(
        actions = differ.out.actions.len(),
        extended = differ.out.extended.len(),
        "computed board diff"
    );
    Ok(differ.out)
}

impl<'a> Differ<'a> {
    fn push(&mut self, action: Action) {
        self.out.actions.push(action);
    }

    fn mark(&mut self, object: ObjectType, id: &str, name: &str, flagged: bool) {
        if flagged && !is_placeholder(id) {
            self.out.extended.push(ExtendedTarget {
                object,
                id: id.to_string(),
                name: name.to_string(),
            });
        }
    }

    fn board(&mut self) {
        let (before, after) = (self.before, self.after);
        if before.name != after.name {
            self.push(Action::RenameBoard {
                board_id: before.id.clone(),
                old_name: before.name.clone(),
                new_name: after.name.clone(),
            });
        }
        self.mark(
            ObjectType::Board,
            &before.id,
            &after.name,
            before.extended || after.extended,
        );
    }

    fn labels(&mut self) {
        let (before, after) = (self.before, self.after);
        for old in &before.labels {
            match after.labels.iter().find(|l| l.id == old.id) {
                Some(new) => {
                    if old.name != new.name {
                        self.push(Action::RenameLabel {
                            label_id: old.id.clone(),
                            old_name: old.name.clone(),
                            new_name: new.name.clone(),
                        });
                    }
                    if old.colour != new.colour {
                        self.push(Action::RecolourLabel {
                            label_id: old.id.clone(),
                            name: new.name.clone(),
                            old_colour: old.colour.clone(),
                            new_colour: new.colour.clone(),
                        });
                    }
                }
                None => self.push(Action::DeleteLabel {
                    label_id: old.id.clone(),
                    name: old.name.clone(),
                }),
            }
        }
        for new in &after.labels {
            if !before.labels.iter().any(|l| l.id == new.id) {
                self.push(Action::CreateLabel {
                    label_id: new.id.clone(),
                    name: new.name.clone(),
                    colour: new.colour.clone(),
                });
            }
        }
    }

    fn lists(&mut self) -> Result<(), DiffError> {
        let (before, after) = (self.before, self.after);
        for old in &before.lists {
            match after.list(&old.id) {
                Some(new) => {
                    if old.name != new.name {
                        self.push(Action::RenameList {
                            list_id: old.id.clone(),
                            old_name: old.name.clone(),
                            new_name: new.name.clone(),
                        });
                    }
                    if old.render_index != new.render_index {
                        self.push(Action::RepositionList {
                            list_id: old.id.clone(),
                            name: new.name.clone(),
                            old_position: old.render_index,
                            new_position: new.render_index,
                        });
                    }
                    self.mark(
                        ObjectType::List,
                        &old.id,
                        &new.name,
                        old.extended || new.extended,
                    );
                    self.existing_cards(old)?;
                    self.new_cards(new)?;
                }
                None => {
                    self.push(Action::ArchiveList {
                        list_id: old.id.clone(),
                        name: old.name.clone(),
                    });
                    // Cards of an archived list go with it, unless they
                    // reappear elsewhere
                    for card in &old.cards {
                        if let Some(&(new_list, new_card)) = self.after_cards.get(card.id.as_str()) {
                            self.existing_card(old, card, new_list, new_card)?;
                        }
                    }
                }
            }
        }

        for new in &after.lists {
            if before.list(&new.id).is_some() {
                continue;
            }
            self.push(Action::CreateList {
                list_id: new.id.clone(),
                name: new.name.clone(),
                position: new.render_index,
            });
            self.new_cards(new)?;
        }
        Ok(())
    }

    /// Cards of a list that still exists: unchanged, edited, moved or deleted
    fn existing_cards(&mut self, old_list: &'a ParsedList) -> Result<(), DiffError> {
        for card in &old_list.cards {
            match self.after_cards.get(card.id.as_str()) {
                Some(&(new_list, new_card)) => {
                    self.existing_card(old_list, card, new_list, new_card)?
                }
                None => self.push(Action::DeleteCard {
                    card_id: card.id.clone(),
                    name: card.name.clone(),
                }),
            }
        }
        Ok(())
    }

    fn existing_card(
        &mut self,
        old_list: &ParsedList,
        old: &ParsedCard,
        new_list: &ParsedList,
        new: &ParsedCard,
    ) -> Result<(), DiffError> {
        if old_list.id == new_list.id {
            if old.position != new.position {
                self.push(Action::RepositionCard {
                    card_id: old.id.clone(),
                    name: new.name.clone(),
                    old_position: old.position,
                    new_position: new.position,
                });
            }
        } else {
            self.push(Action::MoveCard {
                card_id: old.id.clone(),
                name: new.name.clone(),
                from_list: old_list.id.clone(),
                from_list_name: old_list.name.clone(),
                to_list: new_list.id.clone(),
                to_list_name: new_list.name.clone(),
                position: new.position,
            });
        }
        self.card_fields(old, new)?;
        self.mark(
            ObjectType::Card,
            &old.id,
            &new.name,
            old.extended || new.extended,
        );
        Ok(())
    }

    fn card_fields(&mut self, old: &ParsedCard, new: &ParsedCard) -> Result<(), DiffError> {
        if old.name != new.name {
            self.push(Action::RenameCard {
                card_id: old.id.clone(),
                old_name: old.name.clone(),
                new_name: new.name.clone(),
            });
        }
        if old.is_complete() != new.is_complete() {
            self.push(Action::SetCardComplete {
                card_id: old.id.clone(),
                name: new.name.clone(),
                complete: new.is_complete(),
            });
        }

        let (before, after) = (self.before, self.after);
        let old_labels = resolve_labels(old, &before.labels)?;
        let new_labels = resolve_labels(new, &after.labels)?;
        // Deleting a label strips it from every card, so only labels that
        // survive the edit need an explicit remove
        for label in &old_labels {
            if !new_labels.iter().any(|l| l.id == label.id)
                && after.labels.iter().any(|l| l.id == label.id)
            {
                self.push(Action::RemoveCardLabel {
                    card_id: old.id.clone(),
                    card_name: new.name.clone(),
                    label_id: label.id.clone(),
                    label_name: label.name.clone(),
                });
            }
        }
        for label in &new_labels {
            if !old_labels.iter().any(|l| l.id == label.id) {
                self.push(Action::AddCardLabel {
                    card_id: old.id.clone(),
                    card_name: new.name.clone(),
                    label_id: label.id.clone(),
                    label_name: label.name.clone(),
                });
            }
        }

        if old.due != new.due {
            match new.due {
                Some(ref display) => {
                    let action = self.set_due(new, display)?;
                    self.push(action);
                }
                None => self.push(Action::ClearCardDue {
                    card_id: old.id.clone(),
                    name: new.name.clone(),
                }),
            }
        }
        Ok(())
    }

    /// Cards in `list` that exist nowhere in `before`
    fn new_cards(&mut self, list: &'a ParsedList) -> Result<(), DiffError> {
        let after = self.after;
        for card in &list.cards {
            if self.before_cards.contains(card.id.as_str()) {
                continue;
            }
            let labels = resolve_labels(card, &after.labels)?;
            self.push(Action::CreateCard {
                card_id: card.id.clone(),
                list_id: list.id.clone(),
                list_name: list.name.clone(),
                name: card.name.clone(),
                position: card.position,
                complete: card.is_complete(),
            });
            for label in labels {
                self.push(Action::AddCardLabel {
                    card_id: card.id.clone(),
                    card_name: card.name.clone(),
                    label_id: label.id.clone(),
                    label_name: label.name.clone(),
                });
            }
            if let Some(ref display) = card.due {
                let action = self.set_due(card, display)?;
                self.push(action);
            }
        }
        Ok(())
    }

    fn set_due(&self, card: &ParsedCard, display: &str) -> Result<Action, DiffError> {
        let due = display_to_remote(display, self.format).ok_or_else(|| {
            DiffError::InvalidDueDate {
                card: card.name.clone(),
                value: display.to_string(),
            }
        })?;
        Ok(Action::SetCardDue {
            card_id: card.id.clone(),
            name: card.name.clone(),
            due,
            display: display.to_string(),
        })
    }
}

/// Resolve a card's label names against a board's labels, dropping repeats
fn resolve_labels<'l>(
    card: &ParsedCard,
    labels: &'l [ParsedLabel],
) -> Result<Vec<&'l ParsedLabel>, DiffError> {
    let mut resolved: Vec<&ParsedLabel> = Vec::new();
    for name in &card.labels {
        let label = labels
            .iter()
            .find(|l| &l.name == name)
            .ok_or_else(|| DiffError::UnknownLabel {
                card: card.name.clone(),
                label: name.clone(),
            })?;
        if !resolved.iter().any(|l| l.id == label.id) {
            resolved.push(label);
        }
    }
    Ok(resolved)
}
