//! Move/Copy engine: relocate or duplicate whole subtrees
//!
//! Both operations validate the target first and run the bound
//! arithmetic inside one tree transaction, so a failure at any node
//! leaves the tree untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::node_ops::maintain_name;
use super::tree::Tree;
use crate::errors::{ContentError, Result};
use crate::model::{Node, NodeId, Target};
use crate::rules::validation::{self, DESCENDANT_PARENT, INVALID, MISSING, SELF_PARENT};
use crate::{log_op_end, log_op_error, log_op_start};

/// Resolve `target` into a new parent for `node_id`
///
/// # Errors
///
/// `Validation` on `parent_id` for an unparsed value, the node itself,
/// a missing node or one of the node's descendants.
fn resolve_target(tree: &Tree, node_id: NodeId, target: &Target) -> Result<Option<NodeId>> {
    match target {
        Target::Root => Ok(None),
        Target::Unparsed(raw) => {
            tracing::debug!(node_id = node_id.get(), target = raw.as_str(), "unparsed target");
            Err(ContentError::invalid("parent_id", INVALID))
        }
        Target::Node(parent_id) if *parent_id == node_id => {
            Err(ContentError::invalid("parent_id", SELF_PARENT))
        }
        Target::Node(parent_id) if !tree.contains(*parent_id) => {
            Err(ContentError::invalid("parent_id", MISSING))
        }
        Target::Node(parent_id) if tree.is_descendant_of(*parent_id, node_id) => {
            Err(ContentError::invalid("parent_id", DESCENDANT_PARENT))
        }
        Target::Node(parent_id) => Ok(Some(*parent_id)),
    }
}

/// Move a node with its subtree to become the last child of `target`
///
/// Moving to the current parent changes nothing, not even the
/// last-updated timestamp.
///
/// # Errors
///
/// `NodeNotFound` for an unknown node, `Validation` for a bad target or
/// when the node would break slug or singleness rules at its new place.
pub fn move_to(tree: &mut Tree, node_id: NodeId, target: impl Into<Target>) -> Result<()> {
    let target = target.into();
    log_op_start!("node_move", node_id = node_id.get(), target = ?target);
    let start = Instant::now();

    move_to_impl(tree, node_id, &target).map_err(|e| {
        log_op_error!(
            "node_move",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            node_id = node_id.get()
        );
        e
    })?;

    log_op_end!(
        "node_move",
        duration_ms = start.elapsed().as_millis() as u64,
        node_id = node_id.get()
    );
    Ok(())
}

fn move_to_impl(tree: &mut Tree, node_id: NodeId, target: &Target) -> Result<()> {
    let node = tree.get(node_id)?;
    let new_parent = resolve_target(tree, node_id, target)?;
    if new_parent == node.parent_id {
        tracing::debug!(node_id = node_id.get(), "already under target, nothing to move");
        return Ok(());
    }

    let mut candidate = node.clone();
    candidate.parent_id = new_parent;
    validation::validate_node(tree, &candidate).into_result()?;

    tree.transaction(|t| {
        let now = Utc::now();
        t.move_subtree(node_id, new_parent)?;
        t.node_mut(node_id)?.updated_at = now;
        t.touch(now);
        Ok(())
    })
}

/// Duplicate a node with its subtree under `target`
///
/// Every copy gets a fresh id and, for record types, a fresh copy of its
/// content object. The copied root's name goes through `maintain_name`
/// and its slug gets the smallest free `-n` suffix if a sibling has it.
///
/// # Errors
///
/// `NodeNotFound` for an unknown node, `Validation` for a bad target or a
/// copy failing validation at its new place.
pub fn copy_to(tree: &mut Tree, node_id: NodeId, target: impl Into<Target>) -> Result<NodeId> {
    let target = target.into();
    log_op_start!("node_copy", node_id = node_id.get(), target = ?target);
    let start = Instant::now();

    let result = copy_to_impl(tree, node_id, &target).map_err(|e| {
        log_op_error!(
            "node_copy",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            node_id = node_id.get()
        );
        e
    })?;

    log_op_end!(
        "node_copy",
        duration_ms = start.elapsed().as_millis() as u64,
        node_id = result.get()
    );
    Ok(result)
}

fn copy_to_impl(tree: &mut Tree, node_id: NodeId, target: &Target) -> Result<NodeId> {
    tree.get(node_id)?;
    let new_parent = resolve_target(tree, node_id, target)?;
    tree.transaction(|t| copy_subtree(t, node_id, new_parent, Utc::now()))
}

fn copy_subtree(
    tree: &mut Tree,
    node_id: NodeId,
    new_parent: Option<NodeId>,
    now: DateTime<Utc>,
) -> Result<NodeId> {
    let schema = tree.schema().clone();
    let sources: Vec<Node> = tree
        .self_and_descendants(node_id)?
        .into_iter()
        .cloned()
        .collect();

    let mut copied: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut copy_root = None;

    for source in sources {
        let mut copy = source.clone();
        copy.id = tree.allocate_node_id();
        copy.created_at = now;
        copy.updated_at = now;
        copy.content_id = None;

        if source.id == node_id {
            copy.parent_id = new_parent;
            maintain_name(tree, &mut copy);
            copy.slug = free_slug(tree, new_parent, &copy.slug);
        } else {
            let parent_copy = source
                .parent_id
                .and_then(|p| copied.get(&p).copied())
                .ok_or_else(|| ContentError::IntegrityViolation {
                    reason: format!("node {} copied before its parent", source.id),
                })?;
            copy.parent_id = Some(parent_copy);
        }

        validation::validate_node(tree, &copy).into_result()?;

        let registration = schema
            .registry
            .resolve(source.content_type.as_deref())
            .filter(|r| r.is_record());
        if registration.is_some() {
            let original = source.content_id.and_then(|id| tree.get_content(id)).cloned();
            match original {
                Some(original) => {
                    let content_id = tree.allocate_content_id();
                    let mut duplicate = original.duplicate(content_id);
                    duplicate.created_at = now;
                    duplicate.updated_at = now;
                    tree.insert_content(duplicate);
                    copy.content_id = Some(content_id);
                }
                None => tracing::debug!(
                    node_id = source.id.get(),
                    "source has no content object, copy left without one"
                ),
            }
        }

        let copy_id = tree.insert_as_last_child(copy)?;
        copied.insert(source.id, copy_id);
        copy_root.get_or_insert(copy_id);
    }

    tree.touch(now);
    tracing::debug!(
        source = node_id.get(),
        copies = copied.len(),
        "subtree copied"
    );
    copy_root.ok_or(ContentError::NodeNotFound { node_id })
}

/// `slug`, or `slug-n` with the smallest `n` no sibling under `parent` has
fn free_slug(tree: &Tree, parent: Option<NodeId>, slug: &str) -> String {
    let taken: BTreeSet<String> = tree
        .children(parent)
        .into_iter()
        .map(|n| n.slug.clone())
        .collect();
    if !taken.contains(slug) {
        return slug.to_string();
    }
    (1u32..)
        .map(|n| format!("{}-{}", slug, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| slug.to_string())
}
