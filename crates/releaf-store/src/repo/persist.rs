//! Writes the difference between two states of a [`Tree`]

use releaf_content::Tree;
use rusqlite::Connection;

use crate::errors::Result;
use crate::repo::SqliteRepo;

/// Row counts written by one persist call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub nodes_written: usize,
    pub nodes_deleted: usize,
    pub contents_written: usize,
    pub contents_deleted: usize,
}

impl PersistStats {
    pub fn is_empty(&self) -> bool {
        *self == PersistStats::default()
    }
}

/// Persist what changed from `before` to `after`
///
/// Meant to run inside the caller's transaction. Content rows are written
/// before the nodes referring to them and deleted after them.
///
/// # Errors
///
/// `Persistence` on a database failure.
pub fn persist_tree_changes(conn: &Connection, before: &Tree, after: &Tree) -> Result<PersistStats> {
    let mut stats = PersistStats::default();

    for content in after.contents() {
        if before.get_content(content.id) != Some(content) {
            SqliteRepo::persist_content(conn, content)?;
            stats.contents_written += 1;
        }
    }

    for node in after.list_nodes() {
        if before.find(node.id) != Some(node) {
            SqliteRepo::persist_node(conn, node)?;
            stats.nodes_written += 1;
        }
    }

    for node in before.list_nodes() {
        if !after.contains(node.id) && SqliteRepo::delete_node(conn, node.id)? {
            stats.nodes_deleted += 1;
        }
    }

    for content in before.contents() {
        if after.get_content(content.id).is_none() && SqliteRepo::delete_content(conn, content.id)? {
            stats.contents_deleted += 1;
        }
    }

    if let Some(at) = after.nodes_updated_at() {
        if before.nodes_updated_at() != Some(at) {
            SqliteRepo::set_nodes_updated_at(conn, at)?;
        }
    }

    tracing::debug!(
        nodes_written = stats.nodes_written,
        nodes_deleted = stats.nodes_deleted,
        contents_written = stats.contents_written,
        contents_deleted = stats.contents_deleted,
        "tree changes persisted"
    );
    Ok(stats)
}

/// Persist a whole tree into empty tables
///
/// # Errors
///
/// `Persistence` on a database failure.
pub fn persist_tree(conn: &Connection, tree: &Tree) -> Result<PersistStats> {
    let empty = Tree::new(tree.schema().clone());
    persist_tree_changes(conn, &empty, tree)
}
