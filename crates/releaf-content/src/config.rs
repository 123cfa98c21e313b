//! TOML configuration of the content tree

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ContentError, Result};
use crate::node_schema::NodeSchema;
use crate::registry::{ContentTypeConfig, TypeRegistry};
use crate::rules::singleness::SinglenessRule;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub default_locale: Option<String>,
    pub node_fields_to_display: Vec<String>,
    pub content_types: BTreeMap<String, ContentTypeConfig>,
    pub singleness: Vec<SinglenessConfig>,
}

/// One `[[singleness]]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglenessConfig {
    #[serde(rename = "for")]
    pub for_types: Vec<String>,
    pub under: Vec<String>,
}

impl ContentConfig {
    /// # Errors
    ///
    /// `InvalidConfig` when the text is not valid TOML for this shape.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// # Errors
    ///
    /// `Io` when the file can't be read, otherwise as [`Self::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Build the shared schema
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when a singleness rule has no `for` types or names a
    /// type that isn't registered.
    pub fn into_schema(self) -> Result<Arc<NodeSchema>> {
        let mut builder =
            TypeRegistry::builder().node_fields_to_display(self.node_fields_to_display);
        for (name, config) in self.content_types {
            builder = builder.register(&name, config)?;
        }
        let registry = builder.build();

        let mut schema = NodeSchema::new(registry);
        schema.default_locale = self.default_locale.filter(|l| !l.trim().is_empty());

        for rule in self.singleness {
            if rule.for_types.is_empty() {
                return Err(ContentError::InvalidConfig {
                    reason: "singleness rule needs at least one `for` type".to_string(),
                });
            }
            if let Some(unknown) = rule
                .for_types
                .iter()
                .find(|t| schema.registry.resolve(Some(t.as_str())).is_none())
            {
                return Err(ContentError::InvalidConfig {
                    reason: format!("singleness rule names unregistered type {}", unknown),
                });
            }
            schema
                .singleness_rules
                .push(SinglenessRule::new(rule.for_types).under(rule.under));
        }

        tracing::debug!(
            content_types = schema.registry.len(),
            singleness_rules = schema.singleness_rules.len(),
            "content schema built"
        );
        Ok(Arc::new(schema))
    }
}
