use std::collections::BTreeSet;

use crate::model::NodeId;
use crate::ops::Tree;

/// One nested-set inconsistency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// `lft` is not strictly below `rgt`
    InvertedBounds { node_id: NodeId, lft: i64, rgt: i64 },
    /// Bounds don't form the contiguous sequence `1..=2n`
    NonContiguousBounds { expected: usize, found: usize },
    /// Ranges overlap without nesting
    OverlappingRanges { node_id: NodeId, other_id: NodeId },
    /// The innermost range containing the node isn't its parent's
    ContainmentMismatch {
        node_id: NodeId,
        parent_id: Option<NodeId>,
        enclosing_id: Option<NodeId>,
    },
    WrongDepth {
        node_id: NodeId,
        depth: u32,
        expected: u32,
    },
    DanglingParent { node_id: NodeId, parent_id: NodeId },
    /// Following parent pointers from the node loops
    ParentCycle { node_id: NodeId },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::InvertedBounds { node_id, lft, rgt } => {
                write!(f, "node {} has lft {} >= rgt {}", node_id, lft, rgt)
            }
            IntegrityIssue::NonContiguousBounds { expected, found } => write!(
                f,
                "bounds are not contiguous: expected {} distinct values, found {}",
                expected, found
            ),
            IntegrityIssue::OverlappingRanges { node_id, other_id } => {
                write!(f, "ranges of nodes {} and {} overlap", node_id, other_id)
            }
            IntegrityIssue::ContainmentMismatch {
                node_id,
                parent_id,
                enclosing_id,
            } => write!(
                f,
                "node {} has parent {:?} but is enclosed by {:?}",
                node_id, parent_id, enclosing_id
            ),
            IntegrityIssue::WrongDepth {
                node_id,
                depth,
                expected,
            } => write!(
                f,
                "node {} has depth {}, expected {}",
                node_id, depth, expected
            ),
            IntegrityIssue::DanglingParent { node_id, parent_id } => {
                write!(f, "node {} points at missing parent {}", node_id, parent_id)
            }
            IntegrityIssue::ParentCycle { node_id } => {
                write!(f, "parent chain of node {} loops", node_id)
            }
        }
    }
}

/// Find nodes whose parent pointer names a missing node
///
/// Returns (child_id, parent_id) pairs.
pub fn find_dangling_parents(tree: &Tree) -> Vec<(NodeId, NodeId)> {
    tree.list_nodes()
        .into_iter()
        .filter_map(|n| n.parent_id.map(|p| (n.id, p)))
        .filter(|(_, parent)| !tree.contains(*parent))
        .collect()
}

/// Whether following parent pointers from `id` revisits a node
pub fn has_parent_cycle(tree: &Tree, id: NodeId) -> bool {
    let mut visited = BTreeSet::new();
    let mut current = Some(id);

    while let Some(node_id) = current {
        if !visited.insert(node_id) {
            return true;
        }
        current = tree.find(node_id).and_then(|n| n.parent_id);
    }

    false
}

/// Check every nested-set invariant of the tree
///
/// Walks nodes in `lft` order keeping a stack of open ranges; the top of
/// the stack must be each node's parent and the stack height its depth.
pub fn check_integrity(tree: &Tree) -> Vec<IntegrityIssue> {
    let mut issues: Vec<IntegrityIssue> = find_dangling_parents(tree)
        .into_iter()
        .map(|(node_id, parent_id)| IntegrityIssue::DanglingParent { node_id, parent_id })
        .collect();
    issues.extend(
        tree.list_nodes()
            .into_iter()
            .filter(|n| has_parent_cycle(tree, n.id))
            .map(|n| IntegrityIssue::ParentCycle { node_id: n.id }),
    );

    let nodes = tree.list_nodes();

    let mut bounds = BTreeSet::new();
    for node in &nodes {
        if node.lft() >= node.rgt() {
            issues.push(IntegrityIssue::InvertedBounds {
                node_id: node.id,
                lft: node.lft(),
                rgt: node.rgt(),
            });
        }
        bounds.insert(node.lft());
        bounds.insert(node.rgt());
    }
    let expected = nodes.len() * 2;
    let contiguous = bounds.len() == expected
        && bounds.first().map_or(true, |&b| b == 1)
        && bounds.last().map_or(true, |&b| b == expected as i64);
    if !contiguous {
        issues.push(IntegrityIssue::NonContiguousBounds {
            expected,
            found: bounds.len(),
        });
    }
    if !issues.is_empty() {
        return issues;
    }

    let mut open: Vec<(NodeId, i64)> = Vec::new();
    for node in nodes {
        while open.last().is_some_and(|&(_, rgt)| rgt < node.lft()) {
            open.pop();
        }
        if let Some(&(enclosing, rgt)) = open.last() {
            if node.rgt() > rgt {
                issues.push(IntegrityIssue::OverlappingRanges {
                    node_id: node.id,
                    other_id: enclosing,
                });
            }
        }

        let enclosing_id = open.last().map(|&(id, _)| id);
        if enclosing_id != node.parent_id {
            issues.push(IntegrityIssue::ContainmentMismatch {
                node_id: node.id,
                parent_id: node.parent_id,
                enclosing_id,
            });
        }
        let expected_depth = open.len() as u32;
        if node.depth() != expected_depth {
            issues.push(IntegrityIssue::WrongDepth {
                node_id: node.id,
                depth: node.depth(),
                expected: expected_depth,
            });
        }
        open.push((node.id, node.rgt()));
    }

    issues
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{NestedBounds, Node};
    use crate::node_schema::NodeSchema;

    fn row(id: i64, parent: Option<i64>, lft: i64, rgt: i64, depth: u32) -> (Node, NestedBounds) {
        let mut node = Node::new(NodeId(id), format!("n{}", id));
        node.slug = format!("n{}", id);
        node.parent_id = parent.map(NodeId);
        (node, NestedBounds { lft, rgt, depth })
    }

    fn raw_tree(rows: Vec<(Node, NestedBounds)>) -> Tree {
        let mut tree = Tree::new(Arc::new(NodeSchema::default()));
        for (node, bounds) in rows {
            let mut node = node;
            node.set_bounds(bounds);
            tree.insert_raw(node);
        }
        tree
    }

    #[test]
    fn test_consistent_tree_has_no_issues() {
        let tree = raw_tree(vec![
            row(1, None, 1, 6, 0),
            row(2, Some(1), 2, 3, 1),
            row(3, Some(1), 4, 5, 1),
        ]);
        assert!(check_integrity(&tree).is_empty());
    }

    #[test]
    fn test_detects_containment_mismatch() {
        // node 3 claims the root as parent but sits inside node 2
        let tree = raw_tree(vec![
            row(1, None, 1, 6, 0),
            row(2, Some(1), 2, 5, 1),
            row(3, Some(1), 3, 4, 1),
        ]);
        let issues = check_integrity(&tree);

        assert!(issues.iter().any(|i| matches!(
            i,
            IntegrityIssue::ContainmentMismatch { node_id, .. } if *node_id == NodeId(3)
        )));
    }

    #[test]
    fn test_detects_overlap() {
        let tree = raw_tree(vec![row(1, None, 1, 3, 0), row(2, None, 2, 4, 0)]);
        let issues = check_integrity(&tree);

        assert!(issues
            .iter()
            .any(|i| matches!(i, IntegrityIssue::OverlappingRanges { .. })));
    }

    #[test]
    fn test_detects_wrong_depth() {
        let tree = raw_tree(vec![row(1, None, 1, 4, 0), row(2, Some(1), 2, 3, 3)]);
        assert_eq!(
            check_integrity(&tree),
            vec![IntegrityIssue::WrongDepth {
                node_id: NodeId(2),
                depth: 3,
                expected: 1,
            }]
        );
    }

    #[test]
    fn test_detects_gaps_and_dangling_parents() {
        let tree = raw_tree(vec![row(1, None, 1, 2, 0), row(2, Some(9), 5, 6, 0)]);
        let issues = check_integrity(&tree);

        assert!(issues
            .iter()
            .any(|i| matches!(i, IntegrityIssue::DanglingParent { .. })));
        assert!(issues
            .iter()
            .any(|i| matches!(i, IntegrityIssue::NonContiguousBounds { .. })));
    }

    #[test]
    fn test_parent_cycle() {
        let tree = raw_tree(vec![row(1, Some(2), 1, 2, 0), row(2, Some(1), 3, 4, 0)]);
        assert!(has_parent_cycle(&tree, NodeId(1)));
        assert!(!has_parent_cycle(
            &raw_tree(vec![row(1, None, 1, 4, 0), row(2, Some(1), 2, 3, 1)]),
            NodeId(2)
        ));
    }

    #[test]
    fn test_check_integrity_reports_parent_cycles() {
        let tree = raw_tree(vec![
            row(1, None, 1, 2, 0),
            row(2, Some(3), 3, 4, 0),
            row(3, Some(2), 5, 6, 0),
        ]);
        let cycles: Vec<NodeId> = check_integrity(&tree)
            .into_iter()
            .filter_map(|i| match i {
                IntegrityIssue::ParentCycle { node_id } => Some(node_id),
                _ => None,
            })
            .collect();

        assert_eq!(cycles, vec![NodeId(2), NodeId(3)]);
    }
}
