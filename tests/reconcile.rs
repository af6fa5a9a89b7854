use mdboard::model::action::Action;
use mdboard::model::config::DateFormat;
use mdboard::model::snapshot::ParsedBoard;
use mdboard::ops::reconcile::{DiffError, diff};
use mdboard::parse::{IdMapper, parse_board};
use pretty_assertions::assert_eq;

const BEFORE: &str = "\
# Sprint {ab12c}
@bug:red {11111}
@docs:blue {22222}
@ux:green {33333}

## Todo {de34f}
- [ ] Draft outline {9a0b1}
- [ ] Fix login @bug @docs {1b0a9}

## Done {fe43d}
";

fn mapper() -> IdMapper {
    let mut mapper = IdMapper::new();
    for (canonical, token) in [
        ("board-1", "ab12c"),
        ("label-bug", "11111"),
        ("label-docs", "22222"),
        ("label-ux", "33333"),
        ("list-todo", "de34f"),
        ("list-done", "fe43d"),
        ("card-outline", "9a0b1"),
        ("card-login", "1b0a9"),
    ] {
        mapper.register(canonical, token).unwrap();
    }
    mapper
}

/// Parse the pristine document and an edited copy with one mapper, as an
/// editing session does
fn snapshots(edited: &str) -> (ParsedBoard, ParsedBoard) {
    let mut mapper = mapper();
    let before = parse_board(BEFORE, &mut mapper).unwrap();
    let after = parse_board(edited, &mut mapper).unwrap();
    (before, after)
}

fn actions(edited: &str) -> Vec<Action> {
    let (before, after) = snapshots(edited);
    diff(&before, &after, DateFormat::Iso).unwrap().actions
}

fn card_id(action: &Action) -> Option<&str> {
    match action {
        Action::CreateCard { card_id, .. }
        | Action::RenameCard { card_id, .. }
        | Action::RepositionCard { card_id, .. }
        | Action::MoveCard { card_id, .. }
        | Action::SetCardComplete { card_id, .. }
        | Action::AddCardLabel { card_id, .. }
        | Action::RemoveCardLabel { card_id, .. }
        | Action::SetCardDue { card_id, .. }
        | Action::ClearCardDue { card_id, .. }
        | Action::DeleteCard { card_id, .. } => Some(card_id.as_str()),
        _ => None,
    }
}

#[test]
fn test_identical_snapshots_diff_to_nothing() {
    let (before, after) = snapshots(BEFORE);
    let result = diff(&before, &after, DateFormat::Iso).unwrap();
    assert!(result.is_empty());

    let again = diff(&before, &before, DateFormat::Iso).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_complete_toggle_and_due_set() {
    let edited = BEFORE.replace(
        "- [ ] Draft outline {9a0b1}",
        "- [x] Draft outline due:2024-01-15 {9a0b1}",
    );
    assert_eq!(
        actions(&edited),
        vec![
            Action::SetCardComplete {
                card_id: "card-outline".into(),
                name: "Draft outline".into(),
                complete: true,
            },
            Action::SetCardDue {
                card_id: "card-outline".into(),
                name: "Draft outline".into(),
                due: "2024-01-15T00:00:00.000Z".into(),
                display: "2024-01-15".into(),
            },
        ]
    );
}

#[test]
fn test_new_card_without_token_is_created() {
    let edited = BEFORE.replace(
        "- [ ] Fix login @bug @docs {1b0a9}\n",
        "- [ ] Fix login @bug @docs {1b0a9}\n- [ ] Review PR\n",
    );
    assert_eq!(
        actions(&edited),
        vec![Action::CreateCard {
            card_id: "NEW_ITEM_1".into(),
            list_id: "list-todo".into(),
            list_name: "Todo".into(),
            name: "Review PR".into(),
            position: 2,
            complete: false,
        }]
    );
}

#[test]
fn test_moved_card_is_not_deleted() {
    let edited = BEFORE
        .replace("- [ ] Draft outline {9a0b1}\n", "")
        .replace("## Done {fe43d}\n", "## Done {fe43d}\n- [ ] Draft outline {9a0b1}\n");
    let all = actions(&edited);
    let for_card: Vec<&Action> = all
        .iter()
        .filter(|a| card_id(a) == Some("card-outline"))
        .collect();
    assert_eq!(
        for_card,
        vec![&Action::MoveCard {
            card_id: "card-outline".into(),
            name: "Draft outline".into(),
            from_list: "list-todo".into(),
            from_list_name: "Todo".into(),
            to_list: "list-done".into(),
            to_list_name: "Done".into(),
            position: 0,
        }]
    );
    assert!(
        !all.iter()
            .any(|a| matches!(a, Action::DeleteCard { .. } | Action::CreateCard { .. }))
    );
}

#[test]
fn test_label_set_change_touches_only_the_difference() {
    let edited = BEFORE.replace("Fix login @bug @docs", "Fix login @docs @ux");
    assert_eq!(
        actions(&edited),
        vec![
            Action::RemoveCardLabel {
                card_id: "card-login".into(),
                card_name: "Fix login".into(),
                label_id: "label-bug".into(),
                label_name: "bug".into(),
            },
            Action::AddCardLabel {
                card_id: "card-login".into(),
                card_name: "Fix login".into(),
                label_id: "label-ux".into(),
                label_name: "ux".into(),
            },
        ]
    );
}

#[test]
fn test_deleted_card() {
    let edited = BEFORE.replace("- [ ] Draft outline {9a0b1}\n", "");
    let all = actions(&edited);
    assert!(all.contains(&Action::DeleteCard {
        card_id: "card-outline".into(),
        name: "Draft outline".into(),
    }));
    assert!(!all.iter().any(|a| matches!(a, Action::MoveCard { .. })));
}

#[test]
fn test_card_into_new_list_carries_placeholder() {
    let edited = BEFORE
        .replace("- [ ] Draft outline {9a0b1}\n", "")
        .replace("## Done {fe43d}\n", "## Done {fe43d}\n\n## Blocked\n- [ ] Draft outline {9a0b1}\n");
    let all = actions(&edited);
    assert!(all.contains(&Action::CreateList {
        list_id: "NEW_ITEM_1".into(),
        name: "Blocked".into(),
        position: 2,
    }));
    assert!(all.iter().any(|a| matches!(
        a,
        Action::MoveCard { card_id, to_list, .. } if card_id == "card-outline" && to_list == "NEW_ITEM_1"
    )));
}

#[test]
fn test_unknown_label_stops_the_diff() {
    let edited = BEFORE.replace("Draft outline {9a0b1}", "Draft outline @urgent {9a0b1}");
    let (before, after) = snapshots(&edited);
    assert_eq!(
        diff(&before, &after, DateFormat::Iso),
        Err(DiffError::UnknownLabel {
            card: "Draft outline".into(),
            label: "urgent".into(),
        })
    );
}

#[test]
fn test_due_dates_follow_the_configured_format() {
    let edited = BEFORE.replace(
        "- [ ] Draft outline {9a0b1}",
        "- [ ] Draft outline due:15-01-2024 14:30 {9a0b1}",
    );
    let (before, after) = snapshots(&edited);
    let result = diff(&before, &after, DateFormat::Eu).unwrap();
    assert_eq!(
        result.actions,
        vec![Action::SetCardDue {
            card_id: "card-outline".into(),
            name: "Draft outline".into(),
            due: "2024-01-15T14:30:00.000Z".into(),
            display: "15-01-2024 14:30".into(),
        }]
    );

    assert!(matches!(
        diff(&before, &after, DateFormat::Iso),
        Err(DiffError::InvalidDueDate { .. })
    ));
}

#[test]
fn test_extended_marker_without_field_changes() {
    let edited = BEFORE.replace("Fix login @bug @docs {1b0a9}", "Fix login @bug @docs {1b0a9} !");
    let (before, after) = snapshots(&edited);
    let result = diff(&before, &after, DateFormat::Iso).unwrap();
    assert!(result.actions.is_empty());
    assert_eq!(result.extended.len(), 1);
    assert_eq!(result.extended[0].id, "card-login");
    assert_eq!(result.extended[0].name, "Fix login");
}
