use super::*;
use crate::spec::{OperationDescriptor, ResultShape};
use http::Method;
use serde_json::json;

fn widgets_doc() -> SpecDocument {
    SpecDocument::new("Widget Store", "1.0")
        .with_operation(OperationDescriptor::new(
            "listWidgets",
            Method::GET,
            "/widgets",
            ResultShape::from_schema(json!({"type": "array", "items": {"type": "object"}})),
        ))
        .with_operation(OperationDescriptor::new(
            "getWidget",
            Method::GET,
            "/widgets/{id}",
            ResultShape::from_schema(json!({
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "string"}}
            })),
        ))
        .with_operation(OperationDescriptor::new(
            "ping",
            Method::HEAD,
            "/status",
            ResultShape::empty(),
        ))
}

#[test]
fn test_generates_groups_in_first_appearance_order() {
    let source = generate(&widgets_doc(), &GeneratorConfig::default()).unwrap();
    assert_eq!(source.groups(), ["Widgets".to_string(), "Status".to_string()]);
    assert!(source.warnings().is_empty());

    let text = source.text();
    assert!(text.contains("use handler::Base;"));
    assert!(text.contains("group Widgets : Base {"));
    assert!(text.contains("// GET /api/widgets/{id}"));
    assert!(text.contains("op listWidgets() -> Json = [];"));
    assert!(text.contains(r#"op getWidget() -> Json = {"id":"example"};"#));
    assert!(text.contains("op ping() -> Json = null;"));
}

#[test]
fn test_generation_is_deterministic() {
    let config = GeneratorConfig::default();
    let a = generate(&widgets_doc(), &config).unwrap();
    let b = generate(&widgets_doc(), &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_empty_document_declares_nothing() {
    let source = generate(&SpecDocument::new("Empty", "0"), &GeneratorConfig::default()).unwrap();
    assert!(source.groups().is_empty());
    assert!(!source.text().contains("use handler::Base;"));
}

#[test]
fn test_missing_or_blank_operation_id_fails() {
    let mut op = OperationDescriptor::new("", Method::GET, "/widgets", ResultShape::empty());
    let doc = SpecDocument::new("T", "1").with_operation(op.clone());
    assert_eq!(
        generate(&doc, &GeneratorConfig::default()),
        Err(GenerationError::MissingOperationId {
            location: "GET /widgets".into()
        })
    );

    op.operation_id = Some("   ".into());
    let doc = SpecDocument::new("T", "1").with_operation(op.clone());
    assert!(matches!(
        generate(&doc, &GeneratorConfig::default()),
        Err(GenerationError::MissingOperationId { .. })
    ));

    op.operation_id = None;
    let doc = SpecDocument::new("T", "1").with_operation(op);
    assert!(matches!(
        generate(&doc, &GeneratorConfig::default()),
        Err(GenerationError::MissingOperationId { .. })
    ));
}

#[test]
fn test_unusable_operation_id_fails() {
    let doc = SpecDocument::new("T", "1").with_operation(OperationDescriptor::new(
        "---",
        Method::GET,
        "/widgets",
        ResultShape::empty(),
    ));
    assert!(matches!(
        generate(&doc, &GeneratorConfig::default()),
        Err(GenerationError::UnusableOperationId { .. })
    ));
}

fn colliding_doc() -> SpecDocument {
    SpecDocument::new("T", "1")
        .with_operation(OperationDescriptor::new(
            "fetch",
            Method::GET,
            "/widgets",
            ResultShape::from_schema(json!({"type": "integer"})),
        ))
        .with_operation(OperationDescriptor::new(
            "fetch",
            Method::POST,
            "/WIDGETS/{id}",
            ResultShape::from_schema(json!({"type": "boolean"})),
        ))
}

#[test]
fn test_collision_first_wins_with_warning() {
    let source = generate(&colliding_doc(), &GeneratorConfig::default()).unwrap();
    assert_eq!(source.groups(), ["Widgets".to_string()]);
    assert_eq!(source.warnings().len(), 1);
    assert_eq!(source.warnings()[0].location, "POST /WIDGETS/{id}");
    assert!(source.text().contains("op fetch() -> Json = 42;"));
    assert!(!source.text().contains("op fetch() -> Json = true;"));
}

#[test]
fn test_collision_is_error_in_strict_mode() {
    let config = GeneratorConfig {
        strict_collisions: true,
        ..GeneratorConfig::default()
    };
    let err = generate(&colliding_doc(), &config).unwrap_err();
    assert_eq!(
        err,
        GenerationError::Collision {
            group: "Widgets".into(),
            operation: "fetch".into(),
            location: "POST /WIDGETS/{id}".into(),
            first: "GET /widgets".into(),
        }
    );
}

#[test]
fn test_operation_id_naming() {
    let doc = SpecDocument::new("T", "1").with_operation(OperationDescriptor::new(
        "gadgets_list",
        Method::GET,
        "/things",
        ResultShape::empty(),
    ));
    let config = GeneratorConfig {
        naming: NamingStrategy::OperationId,
        ..GeneratorConfig::default()
    };
    let source = generate(&doc, &config).unwrap();
    assert_eq!(source.groups(), ["Gadgets".to_string()]);
    assert!(source.text().contains("op list() -> Json = null;"));
}

#[test]
fn test_title_newlines_do_not_break_comment() {
    let doc = SpecDocument::new("Line one\nop evil() -> Json = 1;", "1");
    let source = generate(&doc, &GeneratorConfig::default()).unwrap();
    assert!(source
        .text()
        .lines()
        .all(|l| !l.trim_start().starts_with("op evil")));
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: GeneratorConfig = serde_yaml::from_str("naming: operation-id\n").unwrap();
    assert_eq!(config.naming, NamingStrategy::OperationId);
    assert_eq!(config.base_path, "api");
    assert_eq!(config.default_group, "Default");
    assert!(!config.strict_collisions);
}

#[test]
fn test_default_group_is_sanitized() {
    let doc = SpecDocument::new("T", "1").with_operation(OperationDescriptor::new(
        "root",
        Method::GET,
        "/{id}",
        ResultShape::empty(),
    ));
    let config = GeneratorConfig {
        default_group: "my group".into(),
        ..GeneratorConfig::default()
    };
    let source = generate(&doc, &config).unwrap();
    assert_eq!(source.groups(), ["my_group".to_string()]);

    let module = crate::builder::build_module(&source, &crate::builder::BuildEnvironment::default())
        .unwrap();
    assert_eq!(module.group_names(), vec!["my_group".to_string()]);
}

#[test]
fn test_unusable_default_group_fails() {
    for name in ["", "   ", "--"] {
        let config = GeneratorConfig {
            default_group: name.into(),
            ..GeneratorConfig::default()
        };
        assert_eq!(
            generate(&SpecDocument::new("T", "1"), &config),
            Err(GenerationError::InvalidDefaultGroup { name: name.into() })
        );
    }
}

fn nested_example(levels: usize) -> SpecDocument {
    let mut value = json!(1);
    for _ in 0..levels {
        value = json!([value]);
    }
    SpecDocument::new("T", "1").with_operation(OperationDescriptor::new(
        "deep",
        Method::GET,
        "/deep",
        ResultShape::from_schema(json!({ "example": value })),
    ))
}

#[test]
fn test_deeply_nested_example_is_rejected() {
    let err = generate(&nested_example(MAX_BODY_NESTING + 1), &GeneratorConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::BodyTooDeep {
            location: "GET /deep".into(),
            limit: MAX_BODY_NESTING,
        }
    );

    // The deepest accepted body still builds.
    let source = generate(&nested_example(MAX_BODY_NESTING), &GeneratorConfig::default()).unwrap();
    let module = crate::builder::build_module(&source, &crate::builder::BuildEnvironment::default())
        .unwrap();
    assert_eq!(module.group_names(), vec!["Deep".to_string()]);
}
