use releaf_core_types::{RequestId, TraceId};
use thiserror::Error;

use crate::model::{ContentId, NodeId};

/// Result type alias using ContentError
pub type Result<T> = std::result::Result<T, ContentError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    Validation,
    NotFound,

    // Structural
    IntegrityViolation,

    // Configuration
    InvalidConfig,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    /// Another writer holds the database lock
    Concurrency,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::IntegrityViolation => "ERR_INTEGRITY_VIOLATION",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
        }
    }

    /// Whether the caller can fix the failure by changing its input
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ExErrorKind::IntegrityViolation | ExErrorKind::Persistence
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the context
/// needed to attribute the failure to a request and a node.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    field_errors: Vec<FieldError>,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            field_errors: Vec::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the field-level report of a failed save
    pub fn with_field_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.field_errors = errors;
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field-level errors; empty unless the kind is `Validation`
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// A single attribute-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Error collection of a candidate node
///
/// All failures of one save attempt are gathered here and reported
/// together; the save is aborted if the collection is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure on `field`
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Messages recorded on `field`, in insertion order
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn has_errors_on(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded, otherwise the whole report
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ContentError::Validation(self))
        }
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Error taxonomy of the content tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// A save was rejected; carries every field-level failure
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    #[error("Content object not found: {content_type}#{content_id}")]
    ContentNotFound {
        content_type: String,
        content_id: ContentId,
    },

    /// Nested-set bounds disagree with the parent pointers
    #[error("Tree integrity violation: {reason}")]
    IntegrityViolation { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl ContentError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ContentError::Validation(errors)
    }

    /// The validation report, if this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ContentError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ContentError> for ExError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(errors) => {
                let message = errors.to_string();
                ExError::new(ExErrorKind::Validation)
                    .with_message(message)
                    .with_field_errors(errors.into_vec())
            }

            ContentError::NodeNotFound { node_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(node_id.to_string())
                .with_message("Node not found"),

            ContentError::ContentNotFound {
                content_type,
                content_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(content_id.to_string())
                .with_message(format!("{} content object not found", content_type)),

            ContentError::IntegrityViolation { reason } => {
                ExError::new(ExErrorKind::IntegrityViolation).with_message(reason)
            }

            ContentError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }

            ContentError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ContentError::Io { message } => ExError::new(ExErrorKind::Io).with_message(message),
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ContentError {
    fn from(err: toml::de::Error) -> Self {
        ContentError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ContentError {
    fn from(err: std::io::Error) -> Self {
        ContentError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::Validation, "ERR_VALIDATION"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::IntegrityViolation, "ERR_INTEGRITY_VIOLATION"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_integrity_violation_is_not_recoverable() {
        assert!(!ExErrorKind::IntegrityViolation.is_recoverable());
        assert!(ExErrorKind::Validation.is_recoverable());
    }

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("slug", "can't be blank");
        errors.add("name", "is too long");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.on("name"), vec!["can't be blank", "is too long"]);
        assert!(errors.has_errors_on("slug"));
        assert!(!errors.has_errors_on("content_type"));
    }

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_maps_to_ex_error_with_fields() {
        let err = ContentError::invalid("content_type", "node exists");
        let ex: ExError = err.into();

        assert_eq!(ex.kind(), ExErrorKind::Validation);
        assert_eq!(ex.field_errors().len(), 1);
        assert_eq!(ex.field_errors()[0].field, "content_type");
        assert_eq!(ex.message(), "content_type node exists");
    }

    #[test]
    fn test_not_found_carries_entity_id() {
        let ex: ExError = ContentError::NodeNotFound {
            node_id: NodeId(7),
        }
        .into();
        assert_eq!(ex.code(), "ERR_NOT_FOUND");
        assert_eq!(ex.entity_id(), Some("7"));
    }
}
