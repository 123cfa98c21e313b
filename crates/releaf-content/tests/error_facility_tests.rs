use releaf_content::errors::{ContentError, ExError, ExErrorKind, ValidationErrors};
use releaf_content::{ContentId, NodeId};

#[test]
fn test_validation_report_keeps_every_field() {
    let mut errors = ValidationErrors::new();
    errors.add("slug", "has already been taken");
    errors.add("content_type", "node exists");

    let ex: ExError = ContentError::Validation(errors).into();

    assert_eq!(ex.kind(), ExErrorKind::Validation);
    assert_eq!(ex.code(), "ERR_VALIDATION");
    let fields: Vec<&str> = ex.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["slug", "content_type"]);
    assert!(ex.kind().is_recoverable());
}

#[test]
fn test_content_not_found_names_type() {
    let ex: ExError = ContentError::ContentNotFound {
        content_type: "Book".to_string(),
        content_id: ContentId(12),
    }
    .into();

    assert_eq!(ex.kind(), ExErrorKind::NotFound);
    assert_eq!(ex.entity_id(), Some("12"));
    assert!(ex.message().contains("Book"));
}

#[test]
fn test_integrity_violation_is_fatal() {
    let ex: ExError = ContentError::IntegrityViolation {
        reason: "ranges of nodes 1 and 2 overlap".to_string(),
    }
    .into();

    assert_eq!(ex.code(), "ERR_INTEGRITY_VIOLATION");
    assert!(!ex.kind().is_recoverable());
}

#[test]
fn test_display_includes_code_op_and_entity() {
    let ex = ExError::from(ContentError::NodeNotFound { node_id: NodeId(3) }).with_op("node_move");

    let text = ex.to_string();
    assert!(text.starts_with("[ERR_NOT_FOUND] in operation 'node_move'"));
    assert!(text.contains("(entity_id: 3)"));
}

#[test]
fn test_source_chain() {
    let inner = ExError::new(ExErrorKind::Io).with_message("disk full");
    let outer = ExError::new(ExErrorKind::Persistence)
        .with_message("commit failed")
        .with_source(inner);

    assert_eq!(outer.source_error().map(ExError::kind), Some(ExErrorKind::Io));
    assert!(std::error::Error::source(&outer).is_some());
}

#[test]
fn test_content_error_messages() {
    assert_eq!(
        ContentError::invalid("parent_id", "is invalid").to_string(),
        "Validation failed: parent_id is invalid"
    );
    assert_eq!(
        ContentError::NodeNotFound { node_id: NodeId(8) }.to_string(),
        "Node not found: 8"
    );
}
