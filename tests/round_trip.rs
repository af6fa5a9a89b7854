use mdboard::model::config::DateFormat;
use mdboard::ops::session::EditSession;
use mdboard::parse::ids::short_token;
use mdboard::parse::{IdMapper, parse_board, render_board};
use mdboard::remote::{BoardClient, CardUpdate, LocalBoardStore, NewCard, NewList};
use pretty_assertions::assert_eq;

const DOCUMENT: &str = "\
# Sprint {ab12c}
@bug:red {11111}
@needs~review:none {22222}

## Todo {de34f}
- [ ] Write docs @bug due:2024-01-15 {9a0b1}
- [x] Ship it @bug @needs~review due:2024-02-01 09:30 {1b0a9}

## Done {fe43d}
- [X] Plan sprint {33333}
";

fn mapper() -> IdMapper {
    let mut mapper = IdMapper::new();
    for (canonical, token) in [
        ("board-1", "ab12c"),
        ("label-bug", "11111"),
        ("label-review", "22222"),
        ("list-todo", "de34f"),
        ("list-done", "fe43d"),
        ("card-docs", "9a0b1"),
        ("card-ship", "1b0a9"),
        ("card-plan", "33333"),
    ] {
        mapper.register(canonical, token).unwrap();
    }
    mapper
}

/// Parse a document, render it back, and assert byte-for-byte equality
fn assert_document_round_trip(source: &str) {
    let mut mapper = mapper();
    let board = parse_board(source, &mut mapper).unwrap();
    let output = render_board(&board, &mapper);
    assert_eq!(output, source, "Round-trip failed");
}

#[test]
fn test_round_trip_full_document() {
    assert_document_round_trip(DOCUMENT);
}

#[test]
fn test_round_trip_board_only() {
    assert_document_round_trip("# Sprint {ab12c}\n");
}

#[test]
fn test_round_trip_extended_markers() {
    let source = DOCUMENT
        .replace("## Todo {de34f}", "## Todo {de34f} !")
        .replace("Plan sprint {33333}", "Plan sprint {33333} !");
    assert_document_round_trip(&source);
}

#[test]
fn test_round_trip_resolves_canonical_ids() {
    let mut mapper = mapper();
    let board = parse_board(DOCUMENT, &mut mapper).unwrap();
    assert_eq!(board.id, "board-1");
    assert_eq!(board.labels[1].name, "needs review");
    let todo = &board.lists[0];
    assert_eq!(todo.id, "list-todo");
    assert_eq!(todo.cards[1].id, "card-ship");
    assert_eq!(todo.cards[1].labels, vec!["bug", "needs review"]);
    assert_eq!(todo.cards[1].due.as_deref(), Some("2024-02-01 09:30"));
    assert!(board.lists[1].cards[0].is_complete());
}

/// Build a board in the local store whose IDs are minted in a known order
fn seeded_store() -> (LocalBoardStore, String) {
    let mut store = LocalBoardStore::new();
    let board = store.add_board("Sprint");
    let bug = store.create_label(&board, "bug", "red").unwrap();
    let review = store.create_label(&board, "needs review", "").unwrap();
    let todo = store
        .create_list(&NewList {
            board_id: board.clone(),
            name: "Todo".into(),
            position: 0,
        })
        .unwrap();
    store
        .create_list(&NewList {
            board_id: board.clone(),
            name: "Done".into(),
            position: 1,
        })
        .unwrap();

    let docs = store
        .create_card(&NewCard {
            list_id: todo.id.clone(),
            name: "Write docs".into(),
            position: 0,
            due_complete: false,
        })
        .unwrap();
    store
        .update_card(
            &docs.id,
            &CardUpdate {
                due: Some(Some("2024-01-15T00:00:00.000Z".into())),
                ..Default::default()
            },
        )
        .unwrap();
    store.add_card_label(&docs.id, &bug.id).unwrap();

    let ship = store
        .create_card(&NewCard {
            list_id: todo.id,
            name: "Ship it".into(),
            position: 1,
            due_complete: true,
        })
        .unwrap();
    store
        .update_card(
            &ship.id,
            &CardUpdate {
                due: Some(Some("2024-02-01T09:30:00.000Z".into())),
                ..Default::default()
            },
        )
        .unwrap();
    store.add_card_label(&ship.id, &review.id).unwrap();

    (store, board)
}

fn token(n: u64) -> String {
    short_token(&format!("{:024x}", n))
}

#[test]
fn test_remote_board_renders_canonical_document() {
    let (store, board) = seeded_store();
    let session = EditSession::open(&store, &board, DateFormat::Iso).unwrap();
    let expected = format!(
        "\
# Sprint {{{}}}
@bug:red {{{}}}
@needs~review:none {{{}}}

## Todo {{{}}}
- [ ] Write docs @bug due:2024-01-15 {{{}}}
- [x] Ship it @needs~review due:2024-02-01 09:30 {{{}}}

## Done {{{}}}
",
        token(1),
        token(2),
        token(3),
        token(4),
        token(6),
        token(7),
        token(5),
    );
    assert_eq!(session.text(), expected);
}

#[test]
fn test_remote_board_round_trips_in_every_date_format() {
    let (store, board) = seeded_store();
    for format in DateFormat::ALL {
        let mut session = EditSession::open(&store, &board, format).unwrap();
        let text = session.text().to_string();
        let result = session.reconcile(&text).unwrap();
        assert!(result.is_empty(), "{:?}: {:?}", format, result);
    }
}

#[test]
fn test_us_and_eu_due_dates() {
    let (store, board) = seeded_store();
    let us = EditSession::open(&store, &board, DateFormat::Us).unwrap();
    assert!(us.text().contains("due:01-15-2024 {"));
    assert!(us.text().contains("due:02-01-2024 09:30 {"));
    let eu = EditSession::open(&store, &board, DateFormat::Eu).unwrap();
    assert!(eu.text().contains("due:15-01-2024 {"));
    assert!(eu.text().contains("due:01-02-2024 09:30 {"));
}
