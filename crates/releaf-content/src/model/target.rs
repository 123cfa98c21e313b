use super::node::NodeId;

/// Destination of a move or copy
///
/// Request parameters arrive as strings, so a target may also be a value
/// that never parsed into an identifier; such a target fails validation
/// rather than being rejected at the type level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Become a root
    Root,
    Node(NodeId),
    Unparsed(String),
}

impl Target {
    /// Parse a request parameter: empty means root, digits mean a node
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Target::Root;
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse::<NodeId>() {
                return Target::Node(id);
            }
        }
        Target::Unparsed(raw.to_string())
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Target::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<NodeId> for Target {
    fn from(id: NodeId) -> Self {
        Target::Node(id)
    }
}

impl From<Option<NodeId>> for Target {
    fn from(id: Option<NodeId>) -> Self {
        id.map_or(Target::Root, Target::Node)
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Target::parse(raw)
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        Target::parse(&raw)
    }
}

impl From<i64> for Target {
    fn from(id: i64) -> Self {
        Target::Node(NodeId(id))
    }
}
