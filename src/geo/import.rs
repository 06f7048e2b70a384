// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Parsing of import files and shaping of payloads.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use super::error::GeoError;

fn is_feature_collection(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("FeatureCollection")
}

/// Collect the features a parsed value contributes.
fn push_features(value: Value, features: &mut Vec<Value>, origin: &str) -> Result<(), GeoError> {
    match value {
        Value::Object(mut object) => {
            if object.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
                match object.remove("features") {
                    Some(Value::Array(inner)) => {
                        for feature in inner {
                            push_features(feature, features, origin)?;
                        }
                        Ok(())
                    }
                    _ => Err(GeoError::Validation(format!(
                        "FeatureCollection without a features array ({origin})"
                    ))),
                }
            } else {
                features.push(Value::Object(object));
                Ok(())
            }
        }
        Value::Array(items) => {
            for item in items {
                push_features(item, features, origin)?;
            }
            Ok(())
        }
        other => Err(GeoError::Validation(format!(
            "Expected a feature object, found {} ({origin})",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn feature_collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

/// Turn file contents into a FeatureCollection.
///
/// The whole text is first tried as a single JSON value (a FeatureCollection,
/// a lone feature object, or an array of features). Otherwise every non-blank
/// line must be a JSON value; FeatureCollection lines contribute their
/// features.
pub fn normalize_import(content: &str) -> Result<Value, GeoError> {
    if content.trim().is_empty() {
        return Err(GeoError::Validation("Import file is empty".to_string()));
    }

    let mut features = Vec::new();

    if let Ok(whole) = serde_json::from_str::<Value>(content) {
        push_features(whole, &mut features, "document")?;
        return Ok(feature_collection(features));
    }

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        let value: Value = serde_json::from_str(line).map_err(|e| {
            GeoError::Validation(format!("Invalid JSON on line {line_number}: {e}"))
        })?;
        push_features(value, &mut features, &format!("line {line_number}"))?;
    }

    if features.is_empty() {
        return Err(GeoError::Validation(
            "Import file contains no features".to_string(),
        ));
    }
    Ok(feature_collection(features))
}

/// Number of features in a payload. Non-collection objects count as one.
pub fn count_features(payload: &Value) -> usize {
    match payload {
        Value::Object(object) => match object.get("features") {
            Some(Value::Array(features)) if is_feature_collection(payload) => features.len(),
            _ => 1,
        },
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

fn strip_keys(object: &mut Map<String, Value>, fields: &BTreeSet<String>) {
    object.retain(|key, _| !fields.contains(key));
}

fn strip_feature(feature: &mut Value, fields: &BTreeSet<String>) {
    if let Some(Value::Object(properties)) = feature.get_mut("properties") {
        strip_keys(properties, fields);
    }
}

/// Remove restricted keys from the top level and from every feature's properties.
pub fn redact_fields(payload: &mut Value, fields: &BTreeSet<String>) {
    if fields.is_empty() {
        return;
    }
    match payload {
        Value::Object(object) => {
            strip_keys(object, fields);
            if let Some(Value::Object(properties)) = object.get_mut("properties") {
                strip_keys(properties, fields);
            }
            if let Some(Value::Array(features)) = object.get_mut("features") {
                features.iter_mut().for_each(|f| strip_feature(f, fields));
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|f| strip_feature(f, fields)),
        _ => {}
    }
}

/// Resolve a client-supplied import path inside `imports_dir`.
///
/// Relative paths are joined onto `imports_dir`. After canonicalization the
/// file must still live under it, which rules out `..` and symlink escapes.
pub fn resolve_import_path(imports_dir: &Path, requested: &str) -> Result<PathBuf, GeoError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(GeoError::Validation("filePath is required".to_string()));
    }

    let root = imports_dir.canonicalize().map_err(|e| {
        GeoError::Internal(format!("Imports directory unavailable: {e}"))
    })?;

    let candidate = Path::new(requested);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    let resolved = joined.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            GeoError::NotFound(format!("Import file not found: {requested}"))
        }
        _ => GeoError::Internal(format!("Cannot resolve import path: {e}")),
    })?;

    if !resolved.starts_with(&root) {
        return Err(GeoError::Validation(
            "Import path must be inside the imports directory".to_string(),
        ));
    }
    if !resolved.is_file() {
        return Err(GeoError::Validation(format!(
            "Import path is not a file: {requested}"
        )));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(value: &Value) -> &Vec<Value> {
        value["features"].as_array().unwrap()
    }

    #[test]
    fn ndjson_lines_become_features() {
        let content = concat!(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{"id":1}}"#,
            "\n\n",
            r#"{"type":"Feature","geometry":null,"properties":{"id":2}}"#,
            "\n",
            r#"{"type":"Feature","geometry":null,"properties":{"id":3}}"#,
            "\n",
        );
        let collection = normalize_import(content).unwrap();

        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(features(&collection).len(), 3);
        assert_eq!(features(&collection)[2]["properties"]["id"], 3);
        assert_eq!(count_features(&collection), 3);
    }

    #[test]
    fn whole_document_collection_is_kept() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}}, {"type": "Feature", "properties": {}}]
        }"#;
        let collection = normalize_import(content).unwrap();
        assert_eq!(features(&collection).len(), 2);
    }

    #[test]
    fn single_object_and_array_are_wrapped() {
        let single = normalize_import(r#"{"type":"Feature","properties":{"a":1}}"#).unwrap();
        assert_eq!(features(&single).len(), 1);

        let array = normalize_import(r#"[{"type":"Feature"},{"type":"Feature"}]"#).unwrap();
        assert_eq!(features(&array).len(), 2);
    }

    #[test]
    fn ndjson_collection_lines_are_flattened() {
        let content = concat!(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature"},{"type":"Feature"}]}"#,
            "\n",
            r#"{"type":"Feature"}"#,
        );
        assert_eq!(features(&normalize_import(content).unwrap()).len(), 3);
    }

    #[test]
    fn bad_input_reports_line() {
        let err = normalize_import("{\"type\":\"Feature\"}\nnot json\n").unwrap_err();
        match err {
            GeoError::Validation(msg) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(normalize_import("  \n"), Err(GeoError::Validation(_))));
        assert!(matches!(normalize_import("42"), Err(GeoError::Validation(_))));
    }

    #[test]
    fn count_features_shapes() {
        assert_eq!(count_features(&json!({"type": "FeatureCollection", "features": []})), 0);
        assert_eq!(count_features(&json!({"type": "Feature"})), 1);
        assert_eq!(count_features(&json!([1, 2, 3])), 3);
        assert_eq!(count_features(&json!("text")), 0);
    }

    #[test]
    fn redaction_reaches_feature_properties() {
        let mut payload = json!({
            "type": "FeatureCollection",
            "owner": "secret",
            "features": [
                {"type": "Feature", "properties": {"owner": "a", "height": 3}},
                {"type": "Feature", "properties": {"height": 4}}
            ]
        });
        let fields = BTreeSet::from(["owner".to_string()]);
        redact_fields(&mut payload, &fields);

        assert!(payload.get("owner").is_none());
        assert!(payload["features"][0]["properties"].get("owner").is_none());
        assert_eq!(payload["features"][0]["properties"]["height"], 3);
    }

    #[test]
    fn import_paths_are_confined() {
        let temp = tempfile::tempdir().unwrap();
        let imports = temp.path().join("imports");
        std::fs::create_dir_all(&imports).unwrap();
        std::fs::write(imports.join("site.geojson"), "{}").unwrap();
        std::fs::write(temp.path().join("outside.json"), "{}").unwrap();

        let resolved = resolve_import_path(&imports, "site.geojson").unwrap();
        assert!(resolved.ends_with("site.geojson"));

        assert!(matches!(
            resolve_import_path(&imports, "../outside.json"),
            Err(GeoError::Validation(_))
        ));
        let outside = temp.path().join("outside.json");
        assert!(matches!(
            resolve_import_path(&imports, outside.to_str().unwrap()),
            Err(GeoError::Validation(_))
        ));
        assert!(matches!(
            resolve_import_path(&imports, "missing.geojson"),
            Err(GeoError::NotFound(_))
        ));
    }
}
