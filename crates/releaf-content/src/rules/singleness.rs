use std::collections::BTreeSet;

use crate::model::Node;
use crate::ops::Tree;

/// "At most one node of these types under the nearest ancestor of those
/// types" (or in the whole tree when `under` is empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinglenessRule {
    for_types: BTreeSet<String>,
    under: BTreeSet<String>,
}

impl SinglenessRule {
    pub fn new<I, S>(for_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            for_types: for_types.into_iter().map(Into::into).collect(),
            under: BTreeSet::new(),
        }
    }

    pub fn under<I, S>(mut self, ancestor_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.under = ancestor_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_types(&self) -> &BTreeSet<String> {
        &self.for_types
    }

    pub fn under_types(&self) -> &BTreeSet<String> {
        &self.under
    }

    pub fn applies_to(&self, content_type: &str) -> bool {
        self.for_types.contains(content_type)
    }

    /// Whether `candidate` may be saved at its `parent_id`
    ///
    /// The parent is looked up by id in `tree` rather than taken from any
    /// chain the caller may hold, and the candidate itself never counts
    /// against the limit.
    pub fn is_satisfied(&self, tree: &Tree, candidate: &Node) -> bool {
        let Some(content_type) = candidate.content_type_name() else {
            return true;
        };
        if !self.applies_to(content_type) {
            return true;
        }

        let conflicting = |node: &&Node| {
            node.id != candidate.id && node.content_type_name() == Some(content_type)
        };

        if self.under.is_empty() {
            return !tree.nodes_of_type(content_type).iter().any(conflicting);
        }

        let Some(parent_id) = candidate.parent_id else {
            return true;
        };
        let Ok(chain) = tree.self_and_ancestors(parent_id) else {
            return true;
        };
        let scope_root = chain
            .into_iter()
            .filter(|n| {
                n.content_type_name()
                    .is_some_and(|t| self.under.contains(t))
            })
            .max_by_key(|n| n.depth());
        let Some(scope_root) = scope_root else {
            return true;
        };

        match tree.descendants(scope_root.id) {
            Ok(scope) => !scope.iter().any(conflicting),
            Err(_) => true,
        }
    }
}
