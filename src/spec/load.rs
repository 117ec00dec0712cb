use super::build::build_document;
use super::types::{ParseError, SpecDocument};
use oas3::OpenApiV3Spec;
use std::path::Path;

fn strip_unknown_verbs(val: &mut serde_json::Value) {
    const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

    if let Some(serde_json::Value::Object(paths_map)) = val.get_mut("paths") {
        for item in paths_map.values_mut() {
            if let serde_json::Value::Object(obj) = item {
                let keys: Vec<String> = obj.keys().cloned().collect();
                for k in keys {
                    let lk = k.to_ascii_lowercase();
                    let keep = match lk.as_str() {
                        "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                        m if METHODS.contains(&m) => true,
                        _ => k.starts_with("x-"),
                    };
                    if !keep {
                        obj.remove(&k);
                    }
                }
            }
        }
    }
}

/// Parse an OpenAPI 3 document from raw bytes (JSON or YAML)
///
/// JSON is detected by a leading `{`; everything else goes through the YAML parser,
/// which also accepts JSON.
pub fn parse_spec(bytes: &[u8]) -> Result<SpecDocument, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Syntax(e.to_string()))?;
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut value: serde_json::Value = if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| ParseError::Syntax(e.to_string()))?
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| ParseError::Syntax(e.to_string()))?
    };

    strip_unknown_verbs(&mut value);
    let spec: OpenApiV3Spec =
        serde_json::from_value(value).map_err(|e| ParseError::NotOpenApi(e.to_string()))?;
    Ok(build_document(&spec))
}

/// Read and parse a specification file.
pub fn load_spec(file_path: impl AsRef<Path>) -> Result<SpecDocument, ParseError> {
    let bytes = std::fs::read(file_path.as_ref())?;
    parse_spec(&bytes)
}
