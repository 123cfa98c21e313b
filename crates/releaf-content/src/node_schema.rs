use std::sync::Arc;

use crate::registry::TypeRegistry;
use crate::rules::singleness::SinglenessRule;

/// Immutable tree configuration: the Type Registry plus the singleness rules
///
/// Built once at startup and shared as `Arc<NodeSchema>` by every tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSchema {
    pub registry: TypeRegistry,
    pub singleness_rules: Vec<SinglenessRule>,
    /// Fallback hint for callers when no node in the chain has a locale
    pub default_locale: Option<String>,
}

impl NodeSchema {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            singleness_rules: Vec::new(),
            default_locale: None,
        }
    }

    pub fn with_singleness(mut self, rule: SinglenessRule) -> Self {
        self.singleness_rules.push(rule);
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
