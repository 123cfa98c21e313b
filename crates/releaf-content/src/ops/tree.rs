use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::{ContentError, Result};
use crate::model::{ContentId, ContentObject, NestedBounds, Node, NodeId};
use crate::node_schema::NodeSchema;
use crate::registry::TypeRegistry;
use crate::rules::invariants;

/// Nested-set content tree held as an arena of nodes by id
///
/// Ancestor and descendant lookups are range comparisons over
/// `(lft, rgt)`; no query walks parent pointers. The bounds are written
/// only by the structural mutations of this module, and every mutation
/// runs inside [`Tree::transaction`], which checks integrity before the
/// new state replaces the old one.
#[derive(Debug, Clone)]
pub struct Tree {
    schema: Arc<NodeSchema>,
    nodes: BTreeMap<NodeId, Node>,
    contents: BTreeMap<ContentId, ContentObject>,
    next_node_id: i64,
    next_content_id: i64,
    nodes_updated_at: Option<DateTime<Utc>>,
}

impl Tree {
    pub fn new(schema: Arc<NodeSchema>) -> Self {
        Self {
            schema,
            nodes: BTreeMap::new(),
            contents: BTreeMap::new(),
            next_node_id: 1,
            next_content_id: 1,
            nodes_updated_at: None,
        }
    }

    /// Rebuild a tree from persisted rows
    ///
    /// Bounds that fail the integrity check are recomputed from the parent
    /// pointers.
    ///
    /// # Errors
    ///
    /// `IntegrityViolation` when a parent pointer dangles or the parent
    /// pointers form a cycle.
    pub fn hydrate(
        schema: Arc<NodeSchema>,
        rows: Vec<(Node, NestedBounds)>,
        contents: Vec<ContentObject>,
        nodes_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let mut tree = Tree::new(schema);
        for (mut node, bounds) in rows {
            node.set_bounds(bounds);
            tree.next_node_id = tree.next_node_id.max(node.id.0 + 1);
            tree.nodes.insert(node.id, node);
        }
        for content in contents {
            tree.next_content_id = tree.next_content_id.max(content.id.0 + 1);
            tree.contents.insert(content.id, content);
        }
        tree.nodes_updated_at = nodes_updated_at;

        let issues = invariants::check_integrity(&tree);
        if !issues.is_empty() {
            tracing::warn!(
                issues = issues.len(),
                first = %issues[0],
                "persisted nested-set bounds inconsistent, rebuilding"
            );
            tree.rebuild()?;
        }
        Ok(tree)
    }

    pub fn schema(&self) -> &Arc<NodeSchema> {
        &self.schema
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.schema.registry
    }

    /// # Errors
    ///
    /// `NodeNotFound` if no node has this id.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or(ContentError::NodeNotFound { node_id: id })
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in nested-set (preorder) order
    pub fn list_nodes(&self) -> Vec<&Node> {
        Self::sorted(self.nodes.values())
    }

    pub fn roots(&self) -> Vec<&Node> {
        Self::sorted(self.nodes.values().filter(|n| n.parent_id.is_none()))
    }

    /// Children of `parent` in order; `None` lists the roots
    pub fn children(&self, parent: Option<NodeId>) -> Vec<&Node> {
        Self::sorted(self.nodes.values().filter(|n| n.parent_id == parent))
    }

    /// Nodes sharing `parent`, minus `exclude`
    pub fn siblings(&self, parent: Option<NodeId>, exclude: Option<NodeId>) -> Vec<&Node> {
        self.children(parent)
            .into_iter()
            .filter(|n| Some(n.id) != exclude)
            .collect()
    }

    /// Strict ancestors, root first
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if `id` is unknown.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<&Node>> {
        let node = self.get(id)?;
        let (lft, rgt) = (node.lft, node.rgt);
        Ok(Self::sorted(self.nodes.values().filter(|n| n.lft < lft && n.rgt > rgt)))
    }

    /// # Errors
    ///
    /// `NodeNotFound` if `id` is unknown.
    pub fn self_and_ancestors(&self, id: NodeId) -> Result<Vec<&Node>> {
        let node = self.get(id)?;
        let (lft, rgt) = (node.lft, node.rgt);
        Ok(Self::sorted(self.nodes.values().filter(|n| n.lft <= lft && n.rgt >= rgt)))
    }

    /// Strict descendants in preorder
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if `id` is unknown.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<&Node>> {
        let node = self.get(id)?;
        let (lft, rgt) = (node.lft, node.rgt);
        Ok(Self::sorted(self.nodes.values().filter(|n| n.lft > lft && n.rgt < rgt)))
    }

    /// # Errors
    ///
    /// `NodeNotFound` if `id` is unknown.
    pub fn self_and_descendants(&self, id: NodeId) -> Result<Vec<&Node>> {
        let node = self.get(id)?;
        let (lft, rgt) = (node.lft, node.rgt);
        Ok(Self::sorted(self.nodes.values().filter(|n| n.lft >= lft && n.rgt <= rgt)))
    }

    /// Whether `id` lies strictly inside `ancestor`'s range
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        match (self.find(id), self.find(ancestor)) {
            (Some(node), Some(anc)) => anc.is_ancestor_of(node),
            _ => false,
        }
    }

    /// Every node whose content type is `type_name`
    pub fn nodes_of_type(&self, type_name: &str) -> Vec<&Node> {
        Self::sorted(
            self.nodes
                .values()
                .filter(|n| n.content_type_name() == Some(type_name)),
        )
    }

    /// The node owning a content object
    pub fn node_for_content(&self, type_name: &str, content_id: ContentId) -> Option<&Node> {
        self.nodes.values().find(|n| {
            n.content_id == Some(content_id) && n.content_type_name() == Some(type_name)
        })
    }

    pub fn get_content(&self, id: ContentId) -> Option<&ContentObject> {
        self.contents.get(&id)
    }

    pub fn contents(&self) -> impl Iterator<Item = &ContentObject> {
        self.contents.values()
    }

    /// Content object linked to a node, if any
    pub fn content_of(&self, node: &Node) -> Option<&ContentObject> {
        node.content_id.and_then(|id| self.contents.get(&id))
    }

    /// When any node was last created, changed or removed
    pub fn nodes_updated_at(&self) -> Option<DateTime<Utc>> {
        self.nodes_updated_at
    }

    /// Id the next created node will receive
    pub fn peek_node_id(&self) -> NodeId {
        NodeId(self.next_node_id)
    }

    fn sorted<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<&'a Node> {
        let mut out: Vec<&Node> = nodes.collect();
        out.sort_by_key(|n| (n.lft, n.id));
        out
    }

    fn max_rgt(&self) -> i64 {
        self.nodes.values().map(|n| n.rgt).max().unwrap_or(0)
    }

    // ---- mutation surface ----

    /// Run `f` against a scratch copy and keep the result only if it
    /// succeeds and leaves consistent bounds
    pub(crate) fn transaction<T>(&mut self, f: impl FnOnce(&mut Tree) -> Result<T>) -> Result<T> {
        let mut scratch = self.clone();
        let value = f(&mut scratch)?;

        let issues = invariants::check_integrity(&scratch);
        if let Some(issue) = issues.first() {
            tracing::error!(issues = issues.len(), first = %issue, "integrity check failed, rolling back");
            return Err(ContentError::IntegrityViolation {
                reason: issue.to_string(),
            });
        }

        *self = scratch;
        Ok(value)
    }

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub(crate) fn allocate_content_id(&mut self) -> ContentId {
        let id = ContentId(self.next_content_id);
        self.next_content_id += 1;
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(ContentError::NodeNotFound { node_id: id })
    }

    pub(crate) fn insert_content(&mut self, content: ContentObject) {
        self.contents.insert(content.id, content);
    }

    pub(crate) fn content_mut(&mut self, id: ContentId) -> Option<&mut ContentObject> {
        self.contents.get_mut(&id)
    }

    pub(crate) fn remove_content(&mut self, id: ContentId) -> Option<ContentObject> {
        self.contents.remove(&id)
    }

    /// Insert a node keeping whatever bounds it carries
    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, node: Node) {
        self.next_node_id = self.next_node_id.max(node.id.0 + 1);
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.nodes_updated_at = Some(at);
    }

    /// Place `node` as the last child of its `parent_id`, or after all roots
    ///
    /// Every bound at or right of the insertion point shifts by two.
    pub(crate) fn insert_as_last_child(&mut self, mut node: Node) -> Result<NodeId> {
        let bounds = match node.parent_id {
            Some(parent_id) => {
                let parent = self.get(parent_id)?;
                let (point, depth) = (parent.rgt, parent.depth + 1);
                for other in self.nodes.values_mut() {
                    if other.rgt >= point {
                        other.rgt += 2;
                    }
                    if other.lft > point {
                        other.lft += 2;
                    }
                }
                NestedBounds {
                    lft: point,
                    rgt: point + 1,
                    depth,
                }
            }
            None => {
                let lft = self.max_rgt() + 1;
                NestedBounds {
                    lft,
                    rgt: lft + 1,
                    depth: 0,
                }
            }
        };
        node.set_bounds(bounds);
        let id = node.id;
        self.next_node_id = self.next_node_id.max(id.0 + 1);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node with its whole subtree and close the gap
    ///
    /// Returns the removed nodes in preorder.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<Node>> {
        let root = self.get(id)?.bounds();
        let doomed: Vec<NodeId> = self
            .self_and_descendants(id)?
            .into_iter()
            .map(|n| n.id)
            .collect();

        let removed: Vec<Node> = doomed
            .iter()
            .filter_map(|id| self.nodes.remove(id))
            .collect();

        let width = root.width();
        for other in self.nodes.values_mut() {
            if other.lft > root.rgt {
                other.lft -= width;
            }
            if other.rgt > root.rgt {
                other.rgt -= width;
            }
        }
        Ok(removed)
    }

    /// Relocate a subtree to be the last child of `new_parent` (or the
    /// last root)
    ///
    /// The subtree block and the block between it and the insertion point
    /// swap places; no other bound changes. Cycle checks are the caller's.
    pub(crate) fn move_subtree(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<()> {
        let node = self.get(id)?.bounds();
        let (target_bound, depth) = match new_parent {
            Some(parent_id) => {
                let parent = self.get(parent_id)?;
                (parent.rgt, parent.depth + 1)
            }
            None => (self.max_rgt() + 1, 0),
        };

        let subtree: BTreeSet<NodeId> = self
            .self_and_descendants(id)?
            .into_iter()
            .map(|n| n.id)
            .collect();

        let (bound, other_bound) = if target_bound > node.rgt {
            (target_bound - 1, node.rgt + 1)
        } else {
            (target_bound, node.lft - 1)
        };

        if bound != node.rgt && bound != node.lft {
            let mut edges = [node.lft, node.rgt, bound, other_bound];
            edges.sort_unstable();
            let [a, b, c, d] = edges;

            let shift = |v: i64| {
                if (a..=b).contains(&v) {
                    v + d - b
                } else if (c..=d).contains(&v) {
                    v + a - c
                } else {
                    v
                }
            };
            for other in self.nodes.values_mut() {
                other.lft = shift(other.lft);
                other.rgt = shift(other.rgt);
            }
        }

        let depth_delta = i64::from(depth) - i64::from(node.depth);
        for member in &subtree {
            if let Some(n) = self.nodes.get_mut(member) {
                n.depth = (i64::from(n.depth) + depth_delta).max(0) as u32;
            }
        }
        self.node_mut(id)?.parent_id = new_parent;
        Ok(())
    }

    /// Recompute every `(lft, rgt, depth)` from the parent pointers
    ///
    /// Siblings keep their current relative order.
    ///
    /// # Errors
    ///
    /// `IntegrityViolation` when a parent pointer dangles or some nodes are
    /// unreachable from the roots (a parent cycle).
    pub fn rebuild(&mut self) -> Result<()> {
        let mut children: BTreeMap<Option<NodeId>, Vec<(i64, NodeId)>> = BTreeMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent_id {
                if !self.nodes.contains_key(&parent_id) {
                    return Err(ContentError::IntegrityViolation {
                        reason: format!("node {} points at missing parent {}", node.id, parent_id),
                    });
                }
            }
            children
                .entry(node.parent_id)
                .or_default()
                .push((node.lft, node.id));
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }

        let mut assigned: BTreeMap<NodeId, NestedBounds> = BTreeMap::new();
        let mut counter = 0;
        // (node, depth, children visited)
        let mut stack: Vec<(NodeId, u32, bool)> = children
            .get(&None)
            .map(|roots| roots.iter().rev().map(|&(_, id)| (id, 0, false)).collect())
            .unwrap_or_default();

        while let Some((id, depth, visited)) = stack.pop() {
            counter += 1;
            if visited {
                if let Some(bounds) = assigned.get_mut(&id) {
                    bounds.rgt = counter;
                }
                continue;
            }
            assigned.insert(
                id,
                NestedBounds {
                    lft: counter,
                    rgt: counter,
                    depth,
                },
            );
            stack.push((id, depth, true));
            if let Some(kids) = children.get(&Some(id)) {
                for &(_, child) in kids.iter().rev() {
                    stack.push((child, depth + 1, false));
                }
            }
        }

        if assigned.len() != self.nodes.len() {
            return Err(ContentError::IntegrityViolation {
                reason: format!(
                    "{} nodes unreachable from any root",
                    self.nodes.len() - assigned.len()
                ),
            });
        }
        for (id, bounds) in assigned {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_bounds(bounds);
            }
        }
        tracing::debug!(nodes = self.nodes.len(), "nested-set bounds rebuilt");
        Ok(())
    }
}
