//! Destroy cascades through the subtree and its content objects

mod common;

use std::sync::Arc;

use common::{add, new_tree, registry, sample};
use releaf_content::ops::destroy_node;
use releaf_content::registry::{ContentTypeConfig, TypeRegistry};
use releaf_content::rules::check_integrity;
use releaf_content::{ContentError, NodeId, NodeSchema, Tree};

#[test]
fn test_destroy_removes_subtree_and_contents() {
    // GIVEN root -> mid -> [leaf1, leaf2] and another root
    let mut s = sample();
    let contents_before = s.tree.contents().count();

    // WHEN mid is destroyed
    let outcome = destroy_node(&mut s.tree, s.mid).unwrap();

    // THEN mid and its descendants are gone with their content objects
    assert_eq!(outcome.removed_nodes, vec![s.mid, s.leaf1, s.leaf2]);
    assert_eq!(outcome.removed_contents.len(), 3);
    assert_eq!(s.tree.contents().count(), contents_before - 3);
    assert_eq!(s.tree.len(), 2);

    // AND the gap is closed
    assert!(check_integrity(&s.tree).is_empty());
    let root = s.tree.get(s.root).unwrap();
    assert_eq!((root.lft(), root.rgt()), (1, 2));
}

#[test]
fn test_destroy_with_unresolvable_type_removes_row_once() {
    // GIVEN a Book node persisted while Book was registered
    let mut tree = new_tree();
    let book = add(&mut tree, "Dune", "Book", None);
    let content_id = tree.get(book).unwrap().content_id.unwrap();
    let rows = tree
        .list_nodes()
        .into_iter()
        .map(|n| (n.clone(), n.bounds()))
        .collect();
    let contents = tree.contents().cloned().collect();

    // AND a registry that no longer knows Book
    let registry = TypeRegistry::builder()
        .register("Text", ContentTypeConfig::record(["id", "text_html"]))
        .unwrap()
        .build();
    let mut tree = Tree::hydrate(
        Arc::new(NodeSchema::new(registry)),
        rows,
        contents,
        None,
    )
    .unwrap();

    // WHEN the node is destroyed
    let outcome = destroy_node(&mut tree, book).unwrap();

    // THEN the row is removed, the content object is left alone
    assert_eq!(outcome.removed_nodes, vec![book]);
    assert!(outcome.removed_contents.is_empty());
    assert!(tree.find(book).is_none());
    assert!(tree.get_content(content_id).is_some());

    // AND a second destroy reports the missing node instead of retrying
    assert_eq!(
        destroy_node(&mut tree, book).unwrap_err(),
        ContentError::NodeNotFound { node_id: book }
    );
}

#[test]
fn test_destroy_controller_node_deletes_no_content() {
    let mut tree = Tree::new(NodeSchema::new(registry()).shared());
    let text = add(&mut tree, "Intro", "Text", None);
    let form = add(&mut tree, "Contacts", "ContactFormController", None);

    let outcome = destroy_node(&mut tree, form).unwrap();

    assert!(outcome.removed_contents.is_empty());
    assert!(tree.content_of(tree.get(text).unwrap()).is_some());
}

#[test]
fn test_destroy_unknown_node() {
    let mut tree = new_tree();

    let err = destroy_node(&mut tree, NodeId(5)).unwrap_err();

    assert_eq!(err, ContentError::NodeNotFound { node_id: NodeId(5) });
}

#[test]
fn test_destroy_updates_last_updated() {
    let mut s = sample();
    let stamp = s.tree.nodes_updated_at().unwrap();

    destroy_node(&mut s.tree, s.leaf2).unwrap();

    assert!(s.tree.nodes_updated_at().unwrap() >= stamp);
}
