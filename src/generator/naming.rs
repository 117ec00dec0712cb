use crate::spec::OperationDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How handler-group and operation names are derived from an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// Group from the first static path segment, operation from the `operationId`
    #[default]
    Path,
    /// `Group_operation` ids split on the first `_`; other ids fall back to [`NamingStrategy::Path`]
    OperationId,
}

impl FromStr for NamingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Ok(NamingStrategy::Path),
            "operation-id" | "operation_id" | "operationid" => Ok(NamingStrategy::OperationId),
            other => Err(format!("unknown naming strategy '{other}'")),
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingStrategy::Path => write!(f, "path"),
            NamingStrategy::OperationId => write!(f, "operation-id"),
        }
    }
}

/// Turn arbitrary text into an identifier the module builder accepts
///
/// Characters outside `[A-Za-z0-9_]` become `_`, and a leading digit gets a `_` prefix.
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let mut s: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    Some(s)
}

/// `user-posts` -> `UserPosts`
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Normalize a base path to its bare segments: `"/api/"` -> `"api"`
#[must_use]
pub fn normalize_base_path(base: &str) -> String {
    base.trim().trim_matches('/').to_string()
}

/// Full route of an operation under the base path
#[must_use]
pub fn route_for(base_path: &str, path: &str) -> String {
    let base = normalize_base_path(base_path);
    let path = path.trim();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if base.is_empty() || path == format!("/{base}") || path.starts_with(&format!("/{base}/")) {
        path
    } else {
        format!("/{base}{path}")
    }
}

fn group_from_path(path: &str, base_path: &str, default_group: &str) -> String {
    let base = normalize_base_path(base_path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Skip the base path if the document already includes it.
    let mut start = 0;
    if !base.is_empty() {
        let base_segments: Vec<&str> = base.split('/').collect();
        if segments.len() > base_segments.len()
            && segments[..base_segments.len()] == base_segments[..]
        {
            start = base_segments.len();
        }
    }

    segments[start..]
        .iter()
        .find(|s| !s.starts_with('{'))
        .map(|s| to_pascal_case(s))
        .and_then(|g| sanitize_identifier(&g))
        .unwrap_or_else(|| default_group.to_string())
}

/// Derive `(group, operation)` for one operation
///
/// Returns `None` when the operation id has no usable identifier characters.
#[must_use]
pub fn derive_names(
    op: &OperationDescriptor,
    operation_id: &str,
    strategy: NamingStrategy,
    base_path: &str,
    default_group: &str,
) -> Option<(String, String)> {
    let operation_id = operation_id.trim();
    if strategy == NamingStrategy::OperationId {
        if let Some((group, name)) = operation_id.split_once('_') {
            let group = sanitize_identifier(&to_pascal_case(group));
            let name = sanitize_identifier(name);
            if let (Some(group), Some(name)) = (group, name) {
                return Some((group, name));
            }
        }
    }
    let name = sanitize_identifier(operation_id)?;
    Some((group_from_path(&op.path, base_path, default_group), name))
}
