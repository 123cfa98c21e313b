//! Loads a [`Tree`] from its SQLite rows

use std::collections::BTreeMap;
use std::sync::Arc;

use releaf_content::{NodeId, NodeSchema, Tree};
use rusqlite::Connection;

use crate::errors::Result;
use crate::repo::SqliteRepo;

/// Read every node, content object and the last-updated setting into a tree
///
/// Persisted bounds that fail the integrity check are recomputed from the
/// parent pointers in memory only; see [`load_tree_for_update`].
///
/// # Errors
///
/// `Persistence` on a database failure, `Serialization` for unreadable
/// stored values, `IntegrityViolation` when parent pointers dangle or loop.
pub fn load_tree(conn: &Connection, schema: Arc<NodeSchema>) -> Result<Tree> {
    load_tree_for_update(conn, schema).map(|(tree, _)| tree)
}

/// Like [`load_tree`], also returning the nodes whose stored bounds were
/// recomputed so the caller can write them back
///
/// # Errors
///
/// As [`load_tree`].
pub fn load_tree_for_update(
    conn: &Connection,
    schema: Arc<NodeSchema>,
) -> Result<(Tree, Vec<NodeId>)> {
    let rows = SqliteRepo::list_nodes(conn)?;
    let contents = SqliteRepo::list_contents(conn)?;
    let updated_at = SqliteRepo::get_nodes_updated_at(conn)?;

    tracing::debug!(
        nodes = rows.len(),
        contents = contents.len(),
        "hydrating tree"
    );
    let stored: BTreeMap<NodeId, _> = rows.iter().map(|(node, bounds)| (node.id, *bounds)).collect();
    let tree = Tree::hydrate(schema, rows, contents, updated_at)?;

    let repaired: Vec<NodeId> = tree
        .list_nodes()
        .into_iter()
        .filter(|node| stored.get(&node.id) != Some(&node.bounds()))
        .map(|node| node.id)
        .collect();
    if !repaired.is_empty() {
        tracing::warn!(repaired = repaired.len(), "stored bounds recomputed");
    }
    Ok((tree, repaired))
}
