use http::Method;
use serde_json::Value;
use std::fmt;

/// HTTP verbs an operation may be generated for.
///
/// `TRACE` and extension methods are never turned into handlers.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
];

/// Returns `true` when `method` is one of [`SUPPORTED_METHODS`].
#[must_use]
pub fn is_supported_method(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

/// Opaque reference to the value an operation returns on success.
///
/// Holds the resolved JSON schema of the preferred success response (with `$ref`s
/// expanded) and the example attached to it, if the document supplied one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultShape {
    /// Status code the shape was taken from
    pub status: Option<u16>,
    /// Resolved JSON schema
    pub schema: Option<Value>,
    /// Example payload from the document
    pub example: Option<Value>,
}

impl ResultShape {
    /// Shape of an operation that declares no response body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shape with a schema and no example.
    #[must_use]
    pub fn from_schema(schema: Value) -> Self {
        Self {
            status: Some(200),
            schema: Some(schema),
            example: None,
        }
    }
}

/// One callable unit described by the document.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    /// `operationId` as written in the document (`None` when absent)
    pub operation_id: Option<String>,
    /// HTTP verb
    pub method: Method,
    /// Path template, e.g. `/widgets/{id}`
    pub path: String,
    /// Success response shape
    pub result_shape: ResultShape,
}

impl OperationDescriptor {
    pub fn new(
        operation_id: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        result_shape: ResultShape,
    ) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            method,
            path: path.into(),
            result_shape,
        }
    }

    /// `METHOD /path` label used in logs and diagnostics
    #[must_use]
    pub fn location(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Parsed, in-memory form of an API interface specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecDocument {
    /// `info.title`
    pub title: String,
    /// `info.version`
    pub version: String,
    /// Operations in document order (paths sorted, verbs in declaration order)
    pub operations: Vec<OperationDescriptor>,
}

impl SpecDocument {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            operations: Vec::new(),
        }
    }

    /// Builder-style helper used by hosts and tests that assemble documents in code.
    #[must_use]
    pub fn with_operation(mut self, op: OperationDescriptor) -> Self {
        self.operations.push(op);
        self
    }
}

/// Malformed specification document.
#[derive(Debug)]
pub enum ParseError {
    /// The input was empty
    Empty,
    /// Not valid JSON/YAML
    Syntax(String),
    /// Valid JSON/YAML but not an OpenAPI 3 document
    NotOpenApi(String),
    /// Reading the document from disk failed
    Io(std::io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "specification document is empty"),
            ParseError::Syntax(msg) => write!(f, "specification is not valid JSON or YAML: {msg}"),
            ParseError::NotOpenApi(msg) => {
                write!(f, "specification is not a valid OpenAPI 3 document: {msg}")
            }
            ParseError::Io(e) => write!(f, "failed to read specification: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}
