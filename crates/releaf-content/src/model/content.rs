use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content object identifier, unique across all content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub i64);

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a record-typed node
///
/// Attributes are kept as a JSON object; only the type's settable
/// attributes ever reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: ContentId,
    pub content_type: String,
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentObject {
    pub fn new(id: ContentId, content_type: impl Into<String>, attributes: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id,
            content_type: content_type.into(),
            attributes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Fresh object with the same type and attributes
    pub fn duplicate(&self, id: ContentId) -> Self {
        Self::new(id, self.content_type.clone(), self.attributes.clone())
    }
}
