//! "At most one node of a type under an ancestor type" rules

mod common;

use common::{add, global_schema, new_tree};
use releaf_content::ops::{create_node, move_to, update_node};
use releaf_content::{ContentError, NewNode, NodeChanges, Target, Tree};

fn assert_node_exists_error(err: ContentError) {
    let errors = err.validation_errors().expect("validation error");
    assert_eq!(errors.on("content_type"), vec!["node exists"]);
}

#[test]
fn test_second_book_under_same_store_fails() {
    // GIVEN a Store holding one Book
    let mut tree = new_tree();
    let store = add(&mut tree, "Shop", "Store", None);
    add(&mut tree, "Dune", "Book", Some(store));

    // WHEN another Book is created in the same Store
    let err = create_node(&mut tree, NewNode::new("Emma", "Book").under(store)).unwrap_err();

    // THEN content_type reports the existing node
    assert_node_exists_error(err);
    assert_eq!(tree.nodes_of_type("Book").len(), 1);
}

#[test]
fn test_book_deeper_in_same_store_fails() {
    let mut tree = new_tree();
    let store = add(&mut tree, "Shop", "Store", None);
    add(&mut tree, "Dune", "Book", Some(store));
    let shelf = add(&mut tree, "Shelf", "Text", Some(store));

    let err = create_node(&mut tree, NewNode::new("Emma", "Book").under(shelf)).unwrap_err();

    assert_node_exists_error(err);
}

#[test]
fn test_book_under_different_store_succeeds() {
    let mut tree = new_tree();
    let store1 = add(&mut tree, "Shop one", "Store", None);
    let store2 = add(&mut tree, "Shop two", "Store", None);
    add(&mut tree, "Dune", "Book", Some(store1));

    let result = create_node(&mut tree, NewNode::new("Emma", "Book").under(store2));

    assert!(result.is_ok());
}

#[test]
fn test_book_without_store_ancestor_succeeds() {
    let mut tree = new_tree();
    let store = add(&mut tree, "Shop", "Store", None);
    add(&mut tree, "Dune", "Book", Some(store));
    let page = add(&mut tree, "Page", "Text", None);

    assert!(create_node(&mut tree, NewNode::new("Emma", "Book").under(page)).is_ok());
    assert!(create_node(&mut tree, NewNode::new("Root book", "Book")).is_ok());
}

#[test]
fn test_nearest_store_scopes_the_rule() {
    // GIVEN outer Store with a Book and an inner Store without one
    let mut tree = new_tree();
    let outer = add(&mut tree, "Outer", "Store", None);
    add(&mut tree, "Dune", "Book", Some(outer));
    let inner = add(&mut tree, "Inner", "Store", Some(outer));

    // WHEN a Book is created in the inner Store
    let result = create_node(&mut tree, NewNode::new("Emma", "Book").under(inner));

    // THEN only the inner Store's subtree is considered
    assert!(result.is_ok());
}

#[test]
fn test_rule_without_under_covers_whole_tree() {
    let mut tree = Tree::new(global_schema());
    let a = add(&mut tree, "A", "Text", None);
    let b = add(&mut tree, "B", "Text", None);
    add(&mut tree, "Dune", "Book", Some(a));

    let under_other = create_node(&mut tree, NewNode::new("Emma", "Book").under(b));
    let at_root = create_node(&mut tree, NewNode::new("Emma", "Book"));

    assert_node_exists_error(under_other.unwrap_err());
    assert_node_exists_error(at_root.unwrap_err());
}

#[test]
fn test_other_types_are_unrestricted() {
    let mut tree = Tree::new(global_schema());
    add(&mut tree, "One", "Text", None);

    assert!(create_node(&mut tree, NewNode::new("Two", "Text")).is_ok());
}

#[test]
fn test_existing_book_does_not_block_its_own_update() {
    let mut tree = Tree::new(global_schema());
    let book = add(&mut tree, "Dune", "Book", None);

    let result = update_node(
        &mut tree,
        book,
        NodeChanges {
            name: Some("Dune (1965)".to_string()),
            ..NodeChanges::default()
        },
    );

    assert!(result.is_ok());
}

#[test]
fn test_moving_book_into_store_with_book_fails() {
    let mut tree = new_tree();
    let store1 = add(&mut tree, "Shop one", "Store", None);
    let store2 = add(&mut tree, "Shop two", "Store", None);
    add(&mut tree, "Dune", "Book", Some(store1));
    let emma = add(&mut tree, "Emma", "Book", Some(store2));

    let err = move_to(&mut tree, emma, Target::Node(store1)).unwrap_err();

    assert_node_exists_error(err);
    assert_eq!(tree.get(emma).unwrap().parent_id, Some(store2));
}

#[test]
fn test_moving_book_within_its_store_succeeds() {
    let mut tree = new_tree();
    let store = add(&mut tree, "Shop", "Store", None);
    let shelf = add(&mut tree, "Shelf", "Text", Some(store));
    let book = add(&mut tree, "Dune", "Book", Some(store));

    move_to(&mut tree, book, shelf).unwrap();

    assert_eq!(tree.get(book).unwrap().parent_id, Some(shelf));
}
