use crate::errors::ValidationErrors;
use crate::model::{Node, MAX_NAME_LEN, MAX_SLUG_LEN};
use crate::ops::Tree;

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const NODE_EXISTS: &str = "node exists";
pub const INVALID: &str = "is invalid";
pub const MISSING: &str = "does not exist";
pub const SELF_PARENT: &str = "can't be parent to itself";
pub const DESCENDANT_PARENT: &str = "can't be a descendant of itself";

fn too_long(max: usize) -> String {
    format!("is too long (maximum is {} characters)", max)
}

/// Validate a candidate node against the current tree
///
/// The candidate may be new (its id not in `tree`) or an edited or
/// relocated copy of an existing node; in the latter case the stored node
/// is excluded from uniqueness checks. Every failure is collected.
pub fn validate_node(tree: &Tree, node: &Node) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    validate_text(&mut errors, "name", &node.name, MAX_NAME_LEN);
    validate_text(&mut errors, "slug", &node.slug, MAX_SLUG_LEN);
    if node.content_type_name().is_none() {
        errors.add("content_type", BLANK);
    }

    validate_parent(tree, node, &mut errors);

    if !node.slug.trim().is_empty()
        && tree
            .siblings(node.parent_id, Some(node.id))
            .iter()
            .any(|sibling| sibling.slug == node.slug)
    {
        errors.add("slug", TAKEN);
    }

    validate_singleness(tree, node, &mut errors);

    errors
}

fn validate_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max {
        errors.add(field, too_long(max));
    }
}

/// Parent must exist and must not be the node or one of its descendants
pub fn validate_parent(tree: &Tree, node: &Node, errors: &mut ValidationErrors) {
    let Some(parent_id) = node.parent_id else {
        return;
    };
    if parent_id == node.id {
        errors.add("parent_id", SELF_PARENT);
    } else if !tree.contains(parent_id) {
        errors.add("parent_id", MISSING);
    } else if tree.is_descendant_of(parent_id, node.id) {
        errors.add("parent_id", DESCENDANT_PARENT);
    }
}

/// Run every configured singleness rule
pub fn validate_singleness(tree: &Tree, node: &Node, errors: &mut ValidationErrors) {
    let violated = tree
        .schema()
        .singleness_rules
        .iter()
        .any(|rule| !rule.is_satisfied(tree, node));
    if violated {
        errors.add("content_type", NODE_EXISTS);
    }
}
