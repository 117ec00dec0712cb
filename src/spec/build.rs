use super::types::{is_supported_method, OperationDescriptor, ResultShape, SpecDocument};
use oas3::spec::{MediaTypeExamples, ObjectOrReference};
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Resolve a JSON Schema `$ref` to the actual schema definition
///
/// Only local component references (`#/components/schemas/<Name>`) are supported.
pub fn resolve_schema_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::ObjectSchema> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    spec.components
        .as_ref()?
        .schemas
        .get(name)
        .and_then(|schema_ref| match schema_ref {
            ObjectOrReference::Object(schema) => Some(schema),
            _ => None,
        })
}

/// Recursively expand all `$ref` references in a schema value
///
/// Each expanded object gets an `x-ref-name` field with the component name it came from.
/// Self-referencing schemas are expanded once and then left as references.
pub fn expand_schema_refs(spec: &OpenApiV3Spec, value: &mut Value) {
    let mut stack = Vec::new();
    expand_inner(spec, value, &mut stack);
}

fn expand_inner(spec: &OpenApiV3Spec, value: &mut Value, stack: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()).map(str::to_owned) {
                if stack.contains(&ref_path) {
                    return;
                }
                if let Some(schema) = resolve_schema_ref(spec, &ref_path) {
                    if let Ok(mut new_val) = serde_json::to_value(schema) {
                        stack.push(ref_path.clone());
                        expand_inner(spec, &mut new_val, stack);
                        stack.pop();
                        if let Some(name) = ref_path.strip_prefix("#/components/schemas/") {
                            if let Value::Object(o) = &mut new_val {
                                o.insert("x-ref-name".to_string(), Value::String(name.to_string()));
                            }
                        }
                        *value = new_val;
                        return;
                    }
                }
            }
            for v in obj.values_mut() {
                expand_inner(spec, v, stack);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                expand_inner(spec, v, stack);
            }
        }
        _ => {}
    }
}

fn media_example(examples: Option<&MediaTypeExamples>) -> Option<Value> {
    match examples {
        Some(MediaTypeExamples::Example { example }) => Some(example.clone()),
        Some(MediaTypeExamples::Examples { examples }) => {
            examples.iter().find_map(|(_, v)| match v {
                ObjectOrReference::Object(obj) => obj.value.clone(),
                _ => None,
            })
        }
        None => None,
    }
}

/// Pick the success response shape of an operation
///
/// Preference order: `200 application/json`, any 2xx JSON, any 2xx with a schema or
/// example, then any JSON response. Operations without a body get [`ResultShape::empty`].
pub fn extract_result_shape(spec: &OpenApiV3Spec, operation: &oas3::spec::Operation) -> ResultShape {
    // status -> media type -> (schema, example)
    let mut all: BTreeMap<u16, BTreeMap<String, (Option<Value>, Option<Value>)>> = BTreeMap::new();

    if let Some(responses_map) = operation.responses.as_ref() {
        for (status_str, resp_ref) in responses_map {
            let Ok(status) = status_str.parse::<u16>() else {
                continue;
            };
            let ObjectOrReference::Object(resp_obj) = resp_ref else {
                continue;
            };
            for (mt, media) in &resp_obj.content {
                let mut schema = match media.schema.as_ref() {
                    Some(ObjectOrReference::Object(schema_obj)) => {
                        serde_json::to_value(schema_obj).ok()
                    }
                    Some(ObjectOrReference::Ref { ref_path, .. }) => {
                        resolve_schema_ref(spec, ref_path).and_then(|s| {
                            let mut v = serde_json::to_value(s).ok()?;
                            if let (Some(name), Value::Object(o)) =
                                (ref_path.strip_prefix("#/components/schemas/"), &mut v)
                            {
                                o.insert("x-ref-name".into(), Value::String(name.to_string()));
                            }
                            Some(v)
                        })
                    }
                    None => None,
                };
                if let Some(ref mut val) = schema {
                    expand_schema_refs(spec, val);
                }
                let example = media_example(media.examples.as_ref());
                all.entry(status)
                    .or_default()
                    .insert(mt.clone(), (schema, example));
            }
        }
    }

    let is_success = |s: &u16| (200..300).contains(s);
    let pick = |status: u16, entry: &(Option<Value>, Option<Value>)| ResultShape {
        status: Some(status),
        schema: entry.0.clone(),
        example: entry.1.clone(),
    };

    if let Some(entry) = all.get(&200).and_then(|m| m.get(JSON_MEDIA_TYPE)) {
        return pick(200, entry);
    }
    if let Some((s, entry)) = all
        .iter()
        .filter(|(s, _)| is_success(s))
        .find_map(|(s, m)| m.get(JSON_MEDIA_TYPE).map(|e| (*s, e)))
    {
        return pick(s, entry);
    }
    for (s, m) in all.iter().filter(|(s, _)| is_success(s)) {
        if let Some(entry) = m.values().find(|(schema, ex)| schema.is_some() || ex.is_some()) {
            return pick(*s, entry);
        }
    }
    if let Some((s, entry)) = all
        .iter()
        .find_map(|(s, m)| m.get(JSON_MEDIA_TYPE).map(|e| (*s, e)))
    {
        return pick(s, entry);
    }
    ResultShape::empty()
}

/// Turn a parsed OpenAPI document into a [`SpecDocument`]
///
/// Operations keep their `operationId` verbatim (absent stays `None`); whether an
/// identifier is usable is decided by the generator, not here.
pub fn build_document(spec: &OpenApiV3Spec) -> SpecDocument {
    let mut doc = SpecDocument::new(spec.info.title.clone(), spec.info.version.clone());

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            for (method, operation) in item.methods() {
                if !is_supported_method(&method) {
                    debug!(path = %path, method = %method, "Skipping unsupported verb");
                    continue;
                }
                doc.operations.push(OperationDescriptor {
                    operation_id: operation.operation_id.clone(),
                    method,
                    path: path.clone(),
                    result_shape: extract_result_shape(spec, operation),
                });
            }
        }
    }

    doc
}
