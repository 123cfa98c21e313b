use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::tree::Tree;
use crate::errors::Result;
use crate::model::{slugify, ContentId, ContentObject, Node, NodeId};
use crate::registry::{ContentTypeRegistration, ID_ATTRIBUTE};
use crate::rules::validation;
use crate::{log_op_end, log_op_error, log_op_start};

/// Input of the node factory
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub name: String,
    /// Derived from the (collision-free) name when absent or blank
    pub slug: Option<String>,
    pub parent_id: Option<NodeId>,
    pub content_type: Option<String>,
    pub locale: Option<String>,
    pub active: bool,
    /// Mass-assigned onto the content object; filtered by settable attributes
    pub content_attributes: Map<String, Value>,
}

impl NewNode {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            parent_id: None,
            content_type: Some(content_type.into()),
            locale: None,
            active: true,
            content_attributes: Map::new(),
        }
    }

    pub fn under(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content_attributes.insert(name.into(), value.into());
        self
    }
}

/// Attribute edits of an existing node; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears the own locale so it is inherited again
    pub locale: Option<Option<String>>,
    pub active: Option<bool>,
    pub content_attributes: Option<Map<String, Value>>,
}

impl NodeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.locale.is_none()
            && self.active.is_none()
            && self.content_attributes.is_none()
    }
}

/// What a destroy removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroyOutcome {
    /// The destroyed node first, then its descendants in preorder
    pub removed_nodes: Vec<NodeId>,
    pub removed_contents: Vec<(String, ContentId)>,
}

/// Create a node, and its content object for record types
///
/// The name gets a `(n)` suffix when a sibling already carries it.
///
/// # Errors
///
/// `Validation` with every failed field; the tree is left unchanged.
pub fn create_node(tree: &mut Tree, new: NewNode) -> Result<NodeId> {
    log_op_start!("node_create", content_type = new.content_type.as_deref());
    let start = Instant::now();

    let result = tree
        .transaction(|t| create_node_in(t, new, Utc::now()))
        .map_err(|e| {
            log_op_error!(
                "node_create",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "node_create",
        duration_ms = start.elapsed().as_millis() as u64,
        node_id = result.get()
    );
    Ok(result)
}

fn create_node_in(tree: &mut Tree, new: NewNode, now: DateTime<Utc>) -> Result<NodeId> {
    let id = tree.allocate_node_id();
    let mut node = Node::new(id, new.name);
    node.parent_id = new.parent_id;
    node.content_type = non_blank(new.content_type);
    node.locale = non_blank(new.locale);
    node.active = new.active;
    node.created_at = now;
    node.updated_at = now;

    maintain_name(tree, &mut node);
    node.slug = non_blank(new.slug).unwrap_or_else(|| slugify(&node.name));

    validation::validate_node(tree, &node).into_result()?;

    let schema = tree.schema().clone();
    match schema.registry.resolve(node.content_type.as_deref()) {
        Some(registration) if registration.is_record() => {
            let attributes = settable_attributes(registration, new.content_attributes);
            let content_id = tree.allocate_content_id();
            let mut content = ContentObject::new(content_id, registration.type_name(), attributes);
            content.created_at = now;
            content.updated_at = now;
            tree.insert_content(content);
            node.content_id = Some(content_id);
        }
        _ if !new.content_attributes.is_empty() => {
            tracing::debug!(
                content_type = node.content_type.as_deref(),
                "content attributes ignored, type has no content object"
            );
        }
        _ => {}
    }

    let id = tree.insert_as_last_child(node)?;
    tree.touch(now);
    Ok(id)
}

/// Edit a node's attributes and its content object's attributes
///
/// The content type and position are not editable here; structure
/// changes go through `move_to`.
///
/// # Errors
///
/// `NodeNotFound` or `Validation`.
pub fn update_node(tree: &mut Tree, node_id: NodeId, changes: NodeChanges) -> Result<()> {
    log_op_start!("node_update", node_id = node_id.get());
    let start = Instant::now();

    tree.transaction(|t| update_node_in(t, node_id, changes, Utc::now()))
        .map_err(|e| {
            log_op_error!(
                "node_update",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "node_update",
        duration_ms = start.elapsed().as_millis() as u64,
        node_id = node_id.get()
    );
    Ok(())
}

fn update_node_in(
    tree: &mut Tree,
    node_id: NodeId,
    changes: NodeChanges,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut node = tree.get(node_id)?.clone();
    if changes.is_empty() {
        return Ok(());
    }

    if let Some(name) = changes.name {
        node.name = name;
    }
    if let Some(slug) = changes.slug {
        node.slug = slug;
    }
    if let Some(locale) = changes.locale {
        node.locale = non_blank(locale);
    }
    if let Some(active) = changes.active {
        node.active = active;
    }
    node.updated_at = now;

    validation::validate_node(tree, &node).into_result()?;

    if let Some(attributes) = changes.content_attributes {
        let schema = tree.schema().clone();
        if let Some(registration) = schema
            .registry
            .resolve(node.content_type.as_deref())
            .filter(|r| r.is_record())
        {
            let attributes = settable_attributes(registration, attributes);
            match node.content_id.and_then(|id| tree.content_mut(id)) {
                Some(content) => {
                    content.attributes.extend(attributes);
                    content.updated_at = now;
                }
                None => {
                    // record-typed node without its object: recreate it
                    let content_id = tree.allocate_content_id();
                    let mut content =
                        ContentObject::new(content_id, registration.type_name(), attributes);
                    content.created_at = now;
                    content.updated_at = now;
                    tree.insert_content(content);
                    node.content_id = Some(content_id);
                }
            }
        }
    }

    *tree.node_mut(node_id)? = node;
    tree.touch(now);
    Ok(())
}

/// Destroy a node with its subtree
///
/// Content objects are deleted for nodes whose type resolves to a record
/// type. An unresolvable type or an already missing content object is
/// skipped; each node row is removed exactly once.
///
/// # Errors
///
/// `NodeNotFound` if the node doesn't exist.
pub fn destroy_node(tree: &mut Tree, node_id: NodeId) -> Result<DestroyOutcome> {
    log_op_start!("node_destroy", node_id = node_id.get());
    let start = Instant::now();

    let outcome = tree
        .transaction(|t| destroy_node_in(t, node_id, Utc::now()))
        .map_err(|e| {
            log_op_error!(
                "node_destroy",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "node_destroy",
        duration_ms = start.elapsed().as_millis() as u64,
        node_id = node_id.get(),
        node_count = outcome.removed_nodes.len()
    );
    Ok(outcome)
}

fn destroy_node_in(tree: &mut Tree, node_id: NodeId, now: DateTime<Utc>) -> Result<DestroyOutcome> {
    let schema = tree.schema().clone();
    let removed = tree.remove_subtree(node_id)?;

    let mut outcome = DestroyOutcome::default();
    for node in removed {
        outcome.removed_nodes.push(node.id);

        let registration = schema
            .registry
            .resolve(node.content_type.as_deref())
            .filter(|r| r.is_record());
        let (Some(registration), Some(content_id)) = (registration, node.content_id) else {
            tracing::debug!(
                node_id = node.id.get(),
                content_type = node.content_type.as_deref(),
                "no resolvable content object to delete"
            );
            continue;
        };
        match tree.remove_content(content_id) {
            Some(_) => outcome
                .removed_contents
                .push((registration.type_name().to_string(), content_id)),
            None => tracing::debug!(
                node_id = node.id.get(),
                content_id = content_id.0,
                "content object already gone"
            ),
        }
    }

    tree.touch(now);
    Ok(outcome)
}

/// Give `node` a name no sibling carries, appending `(n)` with the
/// smallest free `n`
///
/// An existing `(n)` suffix is stripped first, so "Test node(1)" colliding
/// again becomes "Test node(2)" rather than "Test node(1)(1)".
pub fn maintain_name(tree: &Tree, node: &mut Node) {
    let siblings = tree.siblings(node.parent_id, Some(node.id));
    let taken: BTreeSet<&str> = siblings.iter().map(|n| n.name.as_str()).collect();
    if !taken.contains(node.name.as_str()) {
        return;
    }

    let base = base_name(&node.name).to_string();
    let mut n = 1u32;
    loop {
        let candidate = format!("{}({})", base, n);
        if !taken.contains(candidate.as_str()) {
            node.name = candidate;
            return;
        }
        n += 1;
    }
}

/// Name without a trailing `(digits)` suffix
fn base_name(name: &str) -> &str {
    let Some(inner) = name.strip_suffix(')') else {
        return name;
    };
    match inner.rfind('(') {
        Some(open)
            if open + 1 < inner.len() && inner[open + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &name[..open]
        }
        _ => name,
    }
}

/// Keep the type's settable attributes; `id` is never taken from input
pub(crate) fn settable_attributes(
    registration: &ContentTypeRegistration,
    attributes: Map<String, Value>,
) -> Map<String, Value> {
    attributes
        .into_iter()
        .filter(|(key, _)| {
            let keep = key != ID_ATTRIBUTE && registration.is_settable(key);
            if !keep {
                tracing::debug!(
                    content_type = registration.type_name(),
                    attribute = key.as_str(),
                    "attribute not settable, dropped"
                );
            }
            keep
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
