#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{schema, setup_test_db};
use releaf_content::logging_facility::test_capture::init_test_capture;
use std::time::Duration;

use releaf_content::{Command, CommandOutcome, ExErrorKind, NewNode, NodeChanges, NodeId, Target};
use releaf_core_types::schema::{EVENT_END, EVENT_END_ERROR};
use releaf_core_types::{RequestContext, RequestId};
use releaf_engine::apply_node_command;
use releaf_store::repo::hydration::load_tree;
use releaf_store::repo::SqliteRepo;
use rusqlite::{Connection, TransactionBehavior};

fn create(conn: &mut Connection, new: NewNode) -> NodeId {
    apply_node_command(Command::NodeCreate(new), conn, &schema(), &RequestContext::new())
        .unwrap()
        .outcome
        .node_id()
        .unwrap()
}

#[test]
fn test_create_commits_rows() {
    // GIVEN an empty database
    let mut conn = setup_test_db();

    // WHEN a root and a book under it are created
    let home = create(&mut conn, NewNode::new("Home", "Text"));
    let book = create(
        &mut conn,
        NewNode::new("Dune", "Book")
            .under(home)
            .with_attribute("title", "Dune"),
    );

    // THEN both rows are persisted with nested bounds
    let (root, root_bounds) = SqliteRepo::get_node(&conn, home).unwrap().unwrap();
    let (_, book_bounds) = SqliteRepo::get_node(&conn, book).unwrap().unwrap();
    assert_eq!(root.name, "Home");
    assert_eq!((root_bounds.lft, root_bounds.rgt), (1, 4));
    assert_eq!((book_bounds.lft, book_bounds.rgt, book_bounds.depth), (2, 3, 1));
    assert!(SqliteRepo::get_nodes_updated_at(&conn).unwrap().is_some());
}

#[test]
fn test_failed_command_writes_nothing() {
    // GIVEN a store holding one Book
    let mut conn = setup_test_db();
    let store = create(&mut conn, NewNode::new("Shop", "Store"));
    create(&mut conn, NewNode::new("First", "Book").under(store));
    let updated_at = SqliteRepo::get_nodes_updated_at(&conn).unwrap();

    // WHEN a second Book is created in the same store
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-42".to_string()));
    let err = apply_node_command(
        Command::NodeCreate(NewNode::new("Second", "Book").under(store)),
        &mut conn,
        &schema(),
        &ctx,
    )
    .unwrap_err();

    // THEN the error carries the field report and request, and no row changed
    assert_eq!(err.code(), "ERR_VALIDATION");
    assert_eq!(err.op(), Some("node_create"));
    assert_eq!(err.request_id().map(|r| r.as_str()), Some("req-42"));
    assert!(err
        .field_errors()
        .iter()
        .any(|f| f.field == "content_type" && f.message == "node exists"));
    assert_eq!(SqliteRepo::count_nodes(&conn).unwrap(), 2);
    assert_eq!(SqliteRepo::get_nodes_updated_at(&conn).unwrap(), updated_at);
}

#[test]
fn test_move_copy_destroy_sequence() {
    let mut conn = setup_test_db();
    let ctx = RequestContext::new();
    let home = create(&mut conn, NewNode::new("Home", "Text"));
    let about = create(&mut conn, NewNode::new("About", "Text").under(home));
    let news = create(&mut conn, NewNode::new("News", "Text"));

    // Move About under News
    apply_node_command(
        Command::NodeMove {
            node_id: about,
            target: Target::Node(news),
        },
        &mut conn,
        &schema(),
        &ctx,
    )
    .unwrap();

    // Copy News (with About) to the root
    let result = apply_node_command(
        Command::NodeCopy {
            node_id: news,
            target: Target::Root,
        },
        &mut conn,
        &schema(),
        &ctx,
    )
    .unwrap();
    let copy = result.outcome.node_id().unwrap();
    assert_eq!(result.stats.nodes_written, 2);

    // Destroy the original News subtree
    let result = apply_node_command(
        Command::NodeDestroy { node_id: news },
        &mut conn,
        &schema(),
        &ctx,
    )
    .unwrap();
    let CommandOutcome::Destroyed(destroyed) = result.outcome else {
        panic!("expected a destroy outcome");
    };
    assert_eq!(destroyed.removed_nodes, vec![news, about]);

    let tree = load_tree(&conn, schema()).unwrap();
    let roots: Vec<&str> = tree.roots().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(roots, vec!["Home", "News(1)"]);
    assert_eq!(tree.children(Some(copy))[0].name, "About");
    assert_eq!(SqliteRepo::list_contents(&conn).unwrap().len(), 3);
}

#[test]
fn test_update_persists_attribute_edits() {
    let mut conn = setup_test_db();
    let home = create(&mut conn, NewNode::new("Home", "Text"));

    apply_node_command(
        Command::NodeUpdate {
            node_id: home,
            changes: NodeChanges {
                name: Some("Start".to_string()),
                locale: Some(Some("lv".to_string())),
                active: Some(false),
                ..NodeChanges::default()
            },
        },
        &mut conn,
        &schema(),
        &RequestContext::new(),
    )
    .unwrap();

    let (node, _) = SqliteRepo::get_node(&conn, home).unwrap().unwrap();
    assert_eq!(node.name, "Start");
    assert_eq!(node.locale.as_deref(), Some("lv"));
    assert!(!node.active);
}

#[test]
fn test_engine_command_logs_end_events() {
    let capture = init_test_capture();
    let mut conn = setup_test_db();
    create(&mut conn, NewNode::new("Logged", "Text"));

    let _ = apply_node_command(
        Command::NodeDestroy {
            node_id: NodeId(999),
        },
        &mut conn,
        &schema(),
        &RequestContext::new(),
    );

    capture.assert_event_exists("engine_node_command", EVENT_END);
    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("engine_node_command")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("err.code") == Some("ERR_NOT_FOUND")
    });
    assert!(errors >= 1);
}

#[test]
fn test_commands_against_a_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("releaf.db");

    {
        let mut conn = releaf_store::db::open_migrated(&path).unwrap();
        create(&mut conn, NewNode::new("Home", "Text"));
    }

    let conn = releaf_store::db::open_migrated(&path).unwrap();
    assert_eq!(SqliteRepo::count_nodes(&conn).unwrap(), 1);
}

#[test]
fn test_second_writer_waits_for_the_immediate_lock() {
    // GIVEN two connections to one database file
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("releaf.db");
    let mut writer = releaf_store::db::open_migrated(&path).unwrap();
    let mut other = releaf_store::db::open_migrated(&path).unwrap();
    other.busy_timeout(Duration::from_millis(50)).unwrap();
    let home = create(&mut writer, NewNode::new("Home", "Text"));

    // WHEN the first holds an immediate transaction
    let held = writer
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-busy".to_string()));
    let err = apply_node_command(
        Command::NodeCreate(NewNode::new("About", "Text").under(home)),
        &mut other,
        &schema(),
        &ctx,
    )
    .unwrap_err();

    // THEN the second is refused as a retryable concurrency error
    assert_eq!(err.kind(), ExErrorKind::Concurrency);
    assert!(err.kind().is_recoverable());
    assert_eq!(err.op(), Some("node_create"));
    drop(held);
    assert_eq!(SqliteRepo::count_nodes(&other).unwrap(), 1);

    // AND succeeds once the lock is released
    create(&mut other, NewNode::new("About", "Text").under(home));
    assert_eq!(SqliteRepo::count_nodes(&writer).unwrap(), 2);
}
