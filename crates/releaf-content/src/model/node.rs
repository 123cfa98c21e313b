use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentId;

/// Maximum length of `name` and `slug`
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_SLUG_LEN: usize = 255;

/// Node identifier, assigned from a monotonic sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(NodeId)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId(value)
    }
}

/// Nested-set position of a node
///
/// A node's `[lft, rgt]` range strictly contains the ranges of all of its
/// descendants and is disjoint from every other range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedBounds {
    pub lft: i64,
    pub rgt: i64,
    pub depth: u32,
}

impl NestedBounds {
    /// Number of bound slots the subtree occupies
    pub fn width(&self) -> i64 {
        self.rgt - self.lft + 1
    }

    pub fn contains(&self, other: &NestedBounds) -> bool {
        self.lft < other.lft && other.rgt < self.rgt
    }
}

/// A row of the content tree
///
/// The nested-set triple is owned by the tree store; callers read it through
/// [`Node::bounds`] and never write it. Deserialized nodes come back with
/// zeroed bounds until a tree places them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub slug: String,
    /// `None` for roots
    pub parent_id: Option<NodeId>,
    pub content_type: Option<String>,
    pub content_id: Option<ContentId>,
    /// Own locale; `None` inherits from the nearest ancestor that has one
    pub locale: Option<String>,
    pub active: bool,
    #[serde(skip_deserializing)]
    pub(crate) lft: i64,
    #[serde(skip_deserializing)]
    pub(crate) rgt: i64,
    #[serde(skip_deserializing)]
    pub(crate) depth: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Detached node with no parent, no content and zeroed bounds
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            slug: String::new(),
            parent_id: None,
            content_type: None,
            content_id: None,
            locale: None,
            active: true,
            lft: 0,
            rgt: 0,
            depth: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lft(&self) -> i64 {
        self.lft
    }

    pub fn rgt(&self) -> i64 {
        self.rgt
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bounds(&self) -> NestedBounds {
        NestedBounds {
            lft: self.lft,
            rgt: self.rgt,
            depth: self.depth,
        }
    }

    pub(crate) fn set_bounds(&mut self, bounds: NestedBounds) {
        self.lft = bounds.lft;
        self.rgt = bounds.rgt;
        self.depth = bounds.depth;
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.rgt - self.lft == 1
    }

    /// Number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        ((self.rgt - self.lft - 1) / 2).max(0) as usize
    }

    /// Content type name, with blank treated as absent
    pub fn content_type_name(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Whether `other` lies strictly inside this node's range
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        self.bounds().contains(&other.bounds())
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Derive a URL segment from a display name
///
/// Lower-case ASCII alphanumeric runs joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
