//! # Generator Module
//!
//! Turns a parsed [`SpecDocument`] into handler-module source text for the
//! [module builder](crate::builder).
//!
//! ## Overview
//!
//! Every operation in the document becomes one zero-argument operation inside a
//! handler group. The group and operation names come from the configured
//! [`NamingStrategy`]; the operation body is a fixed stub response taken from the
//! response example or synthesized from the response schema.
//!
//! ```text
//! SpecDocument → naming → stub values → askama template → GeneratedSource
//! ```
//!
//! Generation is pure: the same document and configuration always render the same
//! text, and nothing outside the returned [`GeneratedSource`] is touched.
//!
//! ## Generated Source
//!
//! For a document with `GET /widgets` (`listWidgets`, array response) the generator
//! renders:
//!
//! ```text
//! use handler::Base;
//! use result::Json;
//!
//! group Widgets : Base {
//!     // GET /api/widgets
//!     op listWidgets() -> Json = [];
//! }
//! ```
//!
//! ## Collisions
//!
//! Two operations that map to the same `(group, operation)` pair collide. By default the
//! first one wins and the later ones are reported as [`GenerationWarning`]s; with
//! [`GeneratorConfig::strict_collisions`] the collision is a [`GenerationError`].

mod naming;
mod schema;
mod templates;

#[cfg(test)]
mod tests;

pub use naming::{derive_names, normalize_base_path, route_for, sanitize_identifier, NamingStrategy};
pub use schema::{stub_value, value_for_schema};

use crate::spec::SpecDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use templates::{comment_text, render_module, GroupEntry, HandlerModuleTemplateData, OperationEntry};
use tracing::{debug, warn};

/// Options that shape the generated names and routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Prefix every route is grouped under (`api` → `/api/...`)
    pub base_path: String,
    /// How group and operation names are derived
    pub naming: NamingStrategy,
    /// Group used when the path has no static segment
    pub default_group: String,
    /// Treat name collisions as errors instead of dropping later operations
    pub strict_collisions: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_path: "api".to_string(),
            naming: NamingStrategy::Path,
            default_group: "Default".to_string(),
            strict_collisions: false,
        }
    }
}

/// Non-fatal problem found while generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    /// `METHOD /path` of the operation concerned
    pub location: String,
    pub message: String,
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Output of [`generate`]: module source text plus the groups it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    text: String,
    groups: Vec<String>,
    warnings: Vec<GenerationWarning>,
}

impl GeneratedSource {
    /// Wrap hand-written source text. `groups` lists the groups it declares.
    pub fn new(text: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            text: text.into(),
            groups,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declared handler-group names in declaration order
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[must_use]
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }
}

/// The document cannot be turned into handler source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Operation has no `operationId`, or only whitespace
    MissingOperationId { location: String },
    /// `operationId` contains no identifier characters
    UnusableOperationId {
        location: String,
        operation_id: String,
    },
    /// `default_group` contains no identifier characters
    InvalidDefaultGroup { name: String },
    /// Response example nests deeper than the builder reads back
    BodyTooDeep { location: String, limit: usize },
    /// Two operations map to the same name (strict mode only)
    Collision {
        group: String,
        operation: String,
        location: String,
        first: String,
    },
    /// Template rendering failed
    Render(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::MissingOperationId { location } => {
                write!(f, "{location}: operation has no operationId")
            }
            GenerationError::UnusableOperationId {
                location,
                operation_id,
            } => write!(
                f,
                "{location}: operationId '{operation_id}' does not contain a usable identifier"
            ),
            GenerationError::InvalidDefaultGroup { name } => {
                write!(f, "default group '{name}' is not a usable identifier")
            }
            GenerationError::BodyTooDeep { location, limit } => write!(
                f,
                "{location}: response example nests deeper than {limit} levels"
            ),
            GenerationError::Collision {
                group,
                operation,
                location,
                first,
            } => write!(
                f,
                "{location}: '{group}.{operation}' is already generated for {first}"
            ),
            GenerationError::Render(msg) => write!(f, "failed to render handler module: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Deepest array/object nesting a stub body may have.
///
/// The builder reads bodies back with `serde_json`, which stops at 128 levels.
pub const MAX_BODY_NESTING: usize = 100;

fn nests_deeper_than(value: &Value, budget: usize) -> bool {
    match (value, budget.checked_sub(1)) {
        (Value::Array(_) | Value::Object(_), None) => true,
        (Value::Array(items), Some(rest)) => items.iter().any(|v| nests_deeper_than(v, rest)),
        (Value::Object(map), Some(rest)) => map.values().any(|v| nests_deeper_than(v, rest)),
        _ => false,
    }
}

struct PendingGroup {
    entry: GroupEntry,
    // operation name -> location of the first operation that claimed it
    claimed: HashMap<String, String>,
}

/// Generate handler-module source for every operation in `doc`.
///
/// # Errors
///
/// Returns [`GenerationError`] when the default group or an operation id has no usable
/// identifier, when a response example nests deeper than [`MAX_BODY_NESTING`], or on a
/// name collision when `strict_collisions` is set.
pub fn generate(
    doc: &SpecDocument,
    config: &GeneratorConfig,
) -> Result<GeneratedSource, GenerationError> {
    let base_path = normalize_base_path(&config.base_path);
    let default_group = sanitize_identifier(&config.default_group).ok_or_else(|| {
        GenerationError::InvalidDefaultGroup {
            name: config.default_group.clone(),
        }
    })?;
    let mut groups: Vec<PendingGroup> = Vec::new();
    // lower-cased group name -> index into `groups`
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for op in &doc.operations {
        let location = op.location();
        let operation_id = match op.operation_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => return Err(GenerationError::MissingOperationId { location }),
        };
        let (group_name, op_name) = derive_names(
            op,
            operation_id,
            config.naming,
            &base_path,
            &default_group,
        )
        .ok_or_else(|| GenerationError::UnusableOperationId {
            location: location.clone(),
            operation_id: operation_id.to_string(),
        })?;

        let idx = *group_index
            .entry(group_name.to_lowercase())
            .or_insert_with(|| {
                groups.push(PendingGroup {
                    entry: GroupEntry {
                        name: group_name.clone(),
                        operations: Vec::new(),
                    },
                    claimed: HashMap::new(),
                });
                groups.len() - 1
            });
        let group = &mut groups[idx];

        if let Some(first) = group.claimed.get(&op_name) {
            if config.strict_collisions {
                return Err(GenerationError::Collision {
                    group: group.entry.name.clone(),
                    operation: op_name,
                    location,
                    first: first.clone(),
                });
            }
            let warning = GenerationWarning {
                message: format!(
                    "'{}.{}' is already generated for {}; operation skipped",
                    group.entry.name, op_name, first
                ),
                location,
            };
            warn!(location = %warning.location, "{}", warning.message);
            warnings.push(warning);
            continue;
        }

        let stub = stub_value(&op.result_shape);
        if nests_deeper_than(&stub, MAX_BODY_NESTING) {
            return Err(GenerationError::BodyTooDeep {
                location,
                limit: MAX_BODY_NESTING,
            });
        }
        let body =
            serde_json::to_string(&stub).map_err(|e| GenerationError::Render(e.to_string()))?;
        debug!(group = %group.entry.name, operation = %op_name, %location, "Generated operation");
        group.claimed.insert(op_name.clone(), location);
        group.entry.operations.push(OperationEntry {
            name: op_name,
            method: op.method.as_str().to_string(),
            route: comment_text(&route_for(&base_path, &op.path)),
            body,
        });
    }

    let entries: Vec<GroupEntry> = groups.into_iter().map(|g| g.entry).collect();
    let group_names: Vec<String> = entries.iter().map(|g| g.name.clone()).collect();
    let data = HandlerModuleTemplateData {
        title: comment_text(&doc.title),
        version: comment_text(&doc.version),
        base_path,
        has_groups: !entries.is_empty(),
        groups: entries,
    };
    let text = render_module(&data).map_err(|e| GenerationError::Render(e.to_string()))?;

    Ok(GeneratedSource {
        text,
        groups: group_names,
        warnings,
    })
}
