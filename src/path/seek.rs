//! Applies a parsed path to a Variant view.

use crate::error::VariantError;
use crate::path::segment::{ParsedPath, PathSegment};
use crate::variant::Variant;

/// Walks `path` from `root`, stopping at the first segment that cannot be
/// resolved. An empty path returns `root` unchanged.
///
/// A key lookup on a non-object or an index lookup on a non-array is reported
/// as `NotFound`, the same as a missing member. Malformed bytes stay `Decode`.
pub fn seek<'a>(root: Variant<'a>, path: &ParsedPath) -> Result<Variant<'a>, VariantError> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
}

fn step<'a>(current: Variant<'a>, segment: &PathSegment) -> Result<Variant<'a>, VariantError> {
    let result = match segment {
        PathSegment::ObjectExtraction { key } => current.get_object_by_key(key),
        PathSegment::ArrayExtraction { index } => current.get_element_at_index(*index),
    };
    result.map_err(|e| match e {
        VariantError::TypeMismatch { actual, .. } => {
            VariantError::NotFound(format!("Cannot apply segment {} to a {} value", segment, actual))
        }
        other => other,
    })
}

impl<'a> Variant<'a> {
    pub fn seek(&self, path: &ParsedPath) -> Result<Variant<'a>, VariantError> {
        seek(*self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use crate::variant::encode_json;
    use serde_json::json;

    #[test]
    fn test_seek_nested_document() {
        let doc = encode_json(&json!({
            "int_field": 1,
            "array_field": [1, 2],
            "nested": {"list": [{"name": "deep"}]}
        }))
        .unwrap();
        let root = doc.as_variant().unwrap();

        let found = root.seek(&parse_path("$.int_field").unwrap()).unwrap();
        assert_eq!(found.get_int8().unwrap(), 1);

        let found = root.seek(&parse_path("$.array_field[1]").unwrap()).unwrap();
        assert_eq!(found.get_int8().unwrap(), 2);

        let found = root.seek(&parse_path("$.nested.list[0]['name']").unwrap()).unwrap();
        assert_eq!(found.get_string().unwrap(), "deep");
    }

    #[test]
    fn test_root_path_returns_root() {
        let doc = encode_json(&json!(true)).unwrap();
        let root = doc.as_variant().unwrap();
        assert_eq!(seek(root, &ParsedPath::default()).unwrap(), root);
    }

    #[test]
    fn test_missing_members_are_not_found() {
        let doc = encode_json(&json!({"a": [1], "s": "text"})).unwrap();
        let root = doc.as_variant().unwrap();
        for path in ["$.nonexistent", "$.a[5]", "$.s.x", "$.a.x", "$[0]", "$.a[0].b"] {
            let result = root.seek(&parse_path(path).unwrap());
            assert!(matches!(result, Err(VariantError::NotFound(_))), "path: {}", path);
        }
    }

    #[test]
    fn test_seek_is_deterministic() {
        let doc = encode_json(&json!({"k": [null, 3]})).unwrap();
        let root = doc.as_variant().unwrap();
        let path = parse_path("$.k[1]").unwrap();
        let first = root.seek(&path).unwrap();
        let second = root.seek(&path).unwrap();
        assert_eq!(first, second);
    }
}
