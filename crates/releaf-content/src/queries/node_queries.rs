//! Read-only node queries used by menus and edit forms

use chrono::{DateTime, Utc};

use crate::errors::{ContentError, Result};
use crate::model::{ContentObject, Node, NodeId};
use crate::ops::Tree;
use crate::registry::ContentTypeRegistration;
use crate::rules::validation;

/// Registration behind a node's content type
///
/// `None` when the type is blank, absent or not registered; never an error.
pub fn content_class<'t>(tree: &'t Tree, node: &Node) -> Option<&'t ContentTypeRegistration> {
    tree.registry().resolve(node.content_type.as_deref())
}

/// Fields the edit form shows for `view`
///
/// `None` when the type doesn't resolve or has no content object. Types
/// that merge node fields get the node-level fields appended.
///
/// # Errors
///
/// `NodeNotFound` for an unknown node.
pub fn content_fields_to_display(
    tree: &Tree,
    node_id: NodeId,
    view: &str,
) -> Result<Option<Vec<String>>> {
    let node = tree.get(node_id)?;
    let Some(registration) = content_class(tree, node).filter(|r| r.is_record()) else {
        return Ok(None);
    };

    let mut fields = registration.display_fields(view).to_vec();
    if registration.merges_node_fields() {
        for field in tree.registry().node_fields_to_display() {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
    }
    Ok(Some(fields))
}

/// Own locale, else the nearest ancestor's; `None` when no node in the
/// chain has one
///
/// # Errors
///
/// `NodeNotFound` for an unknown node.
pub fn locale(tree: &Tree, node_id: NodeId) -> Result<Option<String>> {
    let node = tree.get(node_id)?;
    if node.locale.is_some() {
        return Ok(node.locale.clone());
    }
    Ok(tree
        .ancestors(node_id)?
        .into_iter()
        .rev()
        .find_map(|ancestor| ancestor.locale.clone()))
}

/// Active, with every ancestor active
///
/// # Errors
///
/// `NodeNotFound` for an unknown node.
pub fn is_available(tree: &Tree, node_id: NodeId) -> Result<bool> {
    Ok(tree
        .self_and_ancestors(node_id)?
        .iter()
        .all(|n| n.active))
}

/// Registered type names a new node under `parent_id` could take
///
/// Each name is tried on a candidate node; names the singleness rules
/// reject there are left out.
pub fn valid_node_content_classes(tree: &Tree, parent_id: Option<NodeId>) -> Vec<String> {
    let mut candidate = Node::new(tree.peek_node_id(), "");
    candidate.parent_id = parent_id;

    tree.registry()
        .all_registered_names()
        .into_iter()
        .filter(|name| {
            candidate.content_type = Some(name.clone());
            let mut errors = crate::errors::ValidationErrors::new();
            validation::validate_singleness(tree, &candidate, &mut errors);
            !errors.has_errors_on("content_type")
        })
        .collect()
}

/// The content object of a node
///
/// `Ok(None)` for nodes whose type has no content object.
///
/// # Errors
///
/// `NodeNotFound` for an unknown node, `ContentNotFound` when a record
/// type's object is missing.
pub fn node_content(tree: &Tree, node_id: NodeId) -> Result<Option<&ContentObject>> {
    let node = tree.get(node_id)?;
    let Some(registration) = content_class(tree, node).filter(|r| r.is_record()) else {
        return Ok(None);
    };
    match node.content_id {
        Some(content_id) => tree
            .get_content(content_id)
            .map(Some)
            .ok_or_else(|| ContentError::ContentNotFound {
                content_type: registration.type_name().to_string(),
                content_id,
            }),
        None => Ok(None),
    }
}

/// When the tree last changed
pub fn nodes_updated_at(tree: &Tree) -> Option<DateTime<Utc>> {
    tree.nodes_updated_at()
}
