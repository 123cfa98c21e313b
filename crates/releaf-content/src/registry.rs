//! Type Registry: which domain types may act as tree content
//!
//! Registrations are built once at startup and are read-only afterwards;
//! the registry is shared through `Arc<NodeSchema>`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{ContentError, Result};

/// Columns never offered for display by default
const HIDDEN_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// The identifier attribute forced into every settable set
pub const ID_ATTRIBUTE: &str = "id";

/// What backs nodes of a content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Persisted content object with columns
    #[default]
    Record,
    /// Page handler with no content object
    Controller,
}

/// Per-type configuration as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentTypeConfig {
    pub kind: ContentKind,
    pub columns: Vec<String>,
    pub permit_attributes: Option<Vec<String>>,
    pub fields_to_display: BTreeMap<String, Vec<String>>,
    pub merge_node_fields: bool,
}

impl ContentTypeConfig {
    pub fn record<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ContentKind::Record,
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn controller() -> Self {
        Self {
            kind: ContentKind::Controller,
            ..Self::default()
        }
    }

    pub fn with_permit_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permit_attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fields_to_display<I, S>(mut self, view: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_to_display
            .insert(view.to_string(), fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn merging_node_fields(mut self) -> Self {
        self.merge_node_fields = true;
        self
    }
}

/// A registered content type
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeRegistration {
    type_name: String,
    kind: ContentKind,
    columns: Vec<String>,
    settable_attributes: Vec<String>,
    default_display: Vec<String>,
    display_overrides: BTreeMap<String, Vec<String>>,
    merge_node_fields: bool,
}

impl ContentTypeRegistration {
    fn from_config(type_name: &str, config: ContentTypeConfig) -> Self {
        let settable_attributes = match &config.permit_attributes {
            Some(permit) => forced_id(permit),
            None => forced_id(&config.columns),
        };
        let default_display = config
            .columns
            .iter()
            .filter(|c| !HIDDEN_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();

        Self {
            type_name: type_name.to_string(),
            kind: config.kind,
            columns: config.columns,
            settable_attributes,
            default_display,
            display_overrides: config.fields_to_display,
            merge_node_fields: config.merge_node_fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn is_record(&self) -> bool {
        self.kind == ContentKind::Record
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Ordered attribute names accepted from mass assignment; starts with `id`
    pub fn settable_attributes(&self) -> &[String] {
        &self.settable_attributes
    }

    pub fn is_settable(&self, attribute: &str) -> bool {
        self.settable_attributes.iter().any(|a| a == attribute)
    }

    /// Fields shown for `view`: the configured override, else the columns
    /// without bookkeeping fields
    pub fn display_fields(&self, view: &str) -> &[String] {
        self.display_overrides
            .get(view)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_display)
    }

    pub fn merges_node_fields(&self) -> bool {
        self.merge_node_fields
    }
}

fn forced_id(attributes: &[String]) -> Vec<String> {
    let mut out = vec![ID_ATTRIBUTE.to_string()];
    for attribute in attributes {
        if !out.contains(attribute) {
            out.push(attribute.clone());
        }
    }
    out
}

/// Process-wide registry of content types
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    types: BTreeMap<String, ContentTypeRegistration>,
    node_fields_to_display: Vec<String>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Look a type up by name
    ///
    /// Blank, absent and unregistered names all resolve to `None`.
    pub fn resolve(&self, type_name: Option<&str>) -> Option<&ContentTypeRegistration> {
        let name = type_name.map(str::trim).filter(|n| !n.is_empty())?;
        self.types.get(name)
    }

    pub fn all_registered_names(&self) -> BTreeSet<String> {
        self.types.keys().cloned().collect()
    }

    /// Node-level display overrides merged into richer type configs
    pub fn node_fields_to_display(&self) -> &[String] {
        &self.node_fields_to_display
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    registry: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// # Errors
    ///
    /// `InvalidConfig` for a blank or already registered name.
    pub fn register(mut self, type_name: &str, config: ContentTypeConfig) -> Result<Self> {
        let name = type_name.trim();
        if name.is_empty() {
            return Err(ContentError::InvalidConfig {
                reason: "content type name can't be blank".to_string(),
            });
        }
        if self.registry.types.contains_key(name) {
            return Err(ContentError::InvalidConfig {
                reason: format!("content type {} registered twice", name),
            });
        }
        self.registry
            .types
            .insert(name.to_string(), ContentTypeRegistration::from_config(name, config));
        Ok(self)
    }

    pub fn node_fields_to_display<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.node_fields_to_display = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> TypeRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .register(
                "Book",
                ContentTypeConfig::record(["id", "title", "year", "created_at", "updated_at"])
                    .with_permit_attributes(["title", "id"]),
            )
            .and_then(|b| b.register("Text", ContentTypeConfig::record(["id", "text_html"])))
            .and_then(|b| b.register("ContactFormController", ContentTypeConfig::controller()))
            .map(TypeRegistryBuilder::build)
            .unwrap()
    }

    #[test]
    fn test_resolve_rejects_blank_and_unknown() {
        let registry = registry();

        assert!(registry.resolve(Some("Book")).is_some());
        assert!(registry.resolve(Some("")).is_none());
        assert!(registry.resolve(Some("   ")).is_none());
        assert!(registry.resolve(None).is_none());
        assert!(registry.resolve(Some("String")).is_none());
    }

    #[test]
    fn test_settable_attributes_force_id_first() {
        let registry = registry();
        let book = registry.resolve(Some("Book")).unwrap();
        assert_eq!(book.settable_attributes(), ["id", "title"]);

        let text = registry.resolve(Some("Text")).unwrap();
        assert_eq!(text.settable_attributes(), ["id", "text_html"]);
    }

    #[test]
    fn test_default_display_hides_bookkeeping_columns() {
        let registry = registry();
        let book = registry.resolve(Some("Book")).unwrap();
        assert_eq!(book.display_fields("index"), ["title", "year"]);
    }

    #[test]
    fn test_display_override_per_view() {
        let registry = TypeRegistry::builder()
            .register(
                "Book",
                ContentTypeConfig::record(["id", "title", "year"])
                    .with_fields_to_display("edit", ["year"]),
            )
            .unwrap()
            .build();
        let book = registry.resolve(Some("Book")).unwrap();

        assert_eq!(book.display_fields("edit"), ["year"]);
        assert_eq!(book.display_fields("index"), ["title", "year"]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let result = TypeRegistry::builder()
            .register("Book", ContentTypeConfig::default())
            .and_then(|b| b.register("Book", ContentTypeConfig::default()));
        assert!(matches!(result, Err(ContentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_all_registered_names() {
        let names = registry().all_registered_names();
        assert_eq!(names.len(), 3);
        assert!(names.contains("ContactFormController"));
    }
}
