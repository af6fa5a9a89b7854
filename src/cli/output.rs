use std::path::Path;

use serde::Serialize;

use crate::model::action::Action;
use crate::model::config::Config;
use crate::model::extended::ExtendedTarget;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BoardJson {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Serialize)]
pub struct PlanJson<'a> {
    pub actions: &'a [Action],
    pub extended: &'a [ExtendedTarget],
}

#[derive(Serialize)]
pub struct ApplyJson {
    pub applied: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extended: Vec<ExtendedTarget>,
}

#[derive(Serialize)]
pub struct ConfigJson {
    pub config_path: String,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    pub date_format: String,
    pub token_set: bool,
}

pub fn config_to_json(config: &Config, config_path: &Path, store: &Path) -> ConfigJson {
    ConfigJson {
        config_path: config_path.display().to_string(),
        store: store.display().to_string(),
        board: config.board.clone(),
        date_format: config.date_format.key().to_string(),
        token_set: config.token.is_some(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `* 0000…01  Sprint` with the selected board starred
pub fn format_board_line(board: &BoardJson) -> String {
    let marker = if board.selected { '*' } else { ' ' };
    format!("{} {}  {}", marker, board.id, board.name)
}

pub fn format_change(action: &Action) -> String {
    format!("Change: {}", action)
}

pub fn format_target(target: &ExtendedTarget) -> String {
    format!("Extended edit: {} \"{}\" {{{}}}", target.object, target.name, target.id)
}

/// One line per action in execution order, then the extended-edit markers
pub fn format_plan(actions: &[Action], extended: &[ExtendedTarget]) -> Vec<String> {
    if actions.is_empty() && extended.is_empty() {
        return vec!["No changes.".to_string()];
    }
    let mut lines: Vec<String> = actions
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{:>3}. {}", i + 1, a))
        .collect();
    lines.extend(extended.iter().map(format_target));
    lines
}

pub fn format_config(config: &Config, config_path: &Path, store: &Path) -> Vec<String> {
    vec![
        format!("config:      {}", config_path.display()),
        format!("store:       {}", store.display()),
        format!("board:       {}", config.board.as_deref().unwrap_or("(none)")),
        format!("date format: {}", config.date_format.label()),
        format!(
            "token:       {}",
            if config.token.is_some() { "set" } else { "(none)" }
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::extended::ObjectType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_plan_numbers_actions() {
        let actions = vec![
            Action::CreateList {
                list_id: "NEW_ITEM_1".into(),
                name: "Done".into(),
                position: 2,
            },
            Action::DeleteCard {
                card_id: "c1".into(),
                name: "Old".into(),
            },
        ];
        let extended = vec![ExtendedTarget {
            object: ObjectType::Card,
            id: "c2".into(),
            name: "Ship".into(),
        }];
        assert_eq!(
            format_plan(&actions, &extended),
            vec![
                "  1. Created list \"Done\" at position 2".to_string(),
                "  2. Deleted card \"Old\"".to_string(),
                "Extended edit: card \"Ship\" {c2}".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_plan_empty() {
        assert_eq!(format_plan(&[], &[]), vec!["No changes.".to_string()]);
    }

    #[test]
    fn test_format_board_line() {
        let board = BoardJson {
            id: "b1".into(),
            name: "Sprint".into(),
            selected: true,
        };
        assert_eq!(format_board_line(&board), "* b1  Sprint");
    }
}
