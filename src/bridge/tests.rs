use super::*;
use crate::config::{CastMode, VariantQueryConfig};
use crate::error::VariantError;
use crate::query::{QueryOutput, VariantQueryFragment};
use crate::types::QueryResultType;
use crate::variant::{encode_json, VariantValue};
use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, Datum, LargeStringArray, NullArray, Scalar, StringArray,
    StringViewArray, StructArray,
};
use arrow::datatypes::{DataType, Field, Int32Type, Int64Type};
use chrono::FixedOffset;
use serde_json::{json, Value};
use std::sync::Arc;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn utc_config() -> Arc<VariantQueryConfig> {
    Arc::new(VariantQueryConfig {
        timezone: Some("UTC".to_string()),
        ..Default::default()
    })
}

/// A `Binary` column of serialized Variant values; `None` becomes a null cell.
fn variant_column(docs: &[Option<Value>]) -> BinaryArray {
    let serialized: Vec<Option<Vec<u8>>> = docs
        .iter()
        .map(|d| d.as_ref().map(|d| encode_json(d).unwrap().serialize()))
        .collect();
    BinaryArray::from_iter(serialized)
}

/// Renders every cell of a pass-through result as JSON text (`None` for null).
fn rendered(output: &QueryOutput) -> Vec<Option<String>> {
    let binary = output.array().as_binary::<i32>();
    binary
        .iter()
        .map(|cell| cell.map(|bytes| VariantValue::view(bytes).unwrap().to_json(&utc()).unwrap()))
        .collect()
}

fn query(docs: &[Option<Value>], path: &dyn Datum) -> QueryOutput {
    let variants = variant_column(docs);
    let args: [&dyn Datum; 2] = [&variants, path];
    variant_query(&args).unwrap()
}

#[test]
fn test_scenarios_from_path_grammar() {
    let cases: Vec<(Value, &str, Option<&str>)> = vec![
        (json!(true), "$", Some("true")),
        (json!(false), "$", Some("false")),
        (json!(42), "$", Some("42")),
        (json!(1234567890123456789i64), "$", Some("1234567890123456789")),
        (json!(1234567890.1234), "$", Some("1234567890.1234")),
        (json!("Less than 64 bytes (❤️ with utf8)"), "$", Some("\"Less than 64 bytes (❤️ with utf8)\"")),
        (json!({"int_field": 1}), "$.int_field", Some("1")),
        (
            json!({"nested_object": {"nested_field": "nested_value"}}),
            "$.nested_object.nested_field",
            Some("\"nested_value\""),
        ),
        (json!({"array_field": [1, 2]}), "$.array_field[0]", Some("1")),
        (
            json!({"nested_array": [{"nested_field": "nested_value"}]}),
            "$.nested_array[0].nested_field",
            Some("\"nested_value\""),
        ),
        (json!(42), "$.nonexistent", None),
        (json!("text"), "$.missing", None),
        (json!({"a": 1}), "$.invalid..path", None),
    ];

    for (doc, path, expected) in cases {
        let paths = StringArray::from(vec![path]);
        let output = query(&[Some(doc.clone())], &paths);
        assert_eq!(
            rendered(&output),
            vec![expected.map(str::to_string)],
            "doc={} path={}",
            doc,
            path
        );
    }
}

#[test]
fn test_quoted_key_matches_dot_key() {
    let doc = json!({"quoted_key": {"x": [10, 20]}});
    let dotted = query(&[Some(doc.clone())], &StringArray::from(vec!["$.quoted_key.x[1]"]));
    let single = query(&[Some(doc.clone())], &StringArray::from(vec!["$['quoted_key']['x'][1]"]));
    let double = query(&[Some(doc)], &StringArray::from(vec!["$[\"quoted_key\"].x[1]"]));
    assert_eq!(rendered(&dotted), vec![Some("20".to_string())]);
    assert_eq!(rendered(&single), rendered(&dotted));
    assert_eq!(rendered(&double), rendered(&dotted));
}

#[test]
fn test_null_rows_propagate() {
    let variants = variant_column(&[Some(json!({"a": 1})), None, Some(json!({"a": 3}))]);
    let paths = StringArray::from(vec![None, Some("$.a"), Some("$.a")]);
    let args: [&dyn Datum; 2] = [&variants, &paths];
    let output = variant_query(&args).unwrap();
    assert_eq!(rendered(&output), vec![None, None, Some("3".to_string())]);
}

#[test]
fn test_null_typed_arguments_give_all_null_output() {
    let variants = variant_column(&[Some(json!(1)), Some(json!(2))]);
    let nulls = NullArray::new(2);
    let args: [&dyn Datum; 2] = [&variants, &nulls];
    let output = variant_query(&args).unwrap();
    assert_eq!(output.array().data_type(), &DataType::Binary);
    assert_eq!(output.array().null_count(), 2);

    let paths = StringArray::from(vec!["$", "$"]);
    let args: [&dyn Datum; 2] = [&nulls, &paths];
    let output = variant_query(&args).unwrap();
    assert_eq!(output.array().null_count(), 2);
}

#[test]
fn test_invalid_arguments_are_fatal() {
    let variants = variant_column(&[Some(json!(1))]);
    let paths = StringArray::from(vec!["$"]);

    let args: [&dyn Datum; 1] = [&variants];
    assert!(matches!(variant_query(&args), Err(VariantError::InvalidArgument(_))));

    // Path column of the wrong type.
    let args: [&dyn Datum; 2] = [&variants, &variants];
    assert!(matches!(variant_query(&args), Err(VariantError::InvalidArgument(_))));

    // Lengths disagree.
    let two_paths = StringArray::from(vec!["$", "$"]);
    let args: [&dyn Datum; 2] = [&variants, &two_paths];
    assert!(matches!(variant_query(&args), Err(VariantError::InvalidArgument(_))));

    let args: [&dyn Datum; 2] = [&variants, &paths];
    assert!(variant_query(&args).is_ok());
}

#[test]
fn test_large_and_view_path_columns() {
    let docs = [Some(json!({"a": {"b": 9}})), Some(json!({"a": {"b": 10}}))];
    let variants = variant_column(&docs);
    let large = LargeStringArray::from(vec!["$.a.b", "$['a']"]);
    let view = StringViewArray::from(vec!["$.a.b", "$['a']"]);
    for paths in [&large as &dyn Datum, &view as &dyn Datum] {
        let output = variant_query_as(&variants, paths, &DataType::Utf8, utc_config()).unwrap();
        let strings = output.array().as_string::<i32>();
        assert_eq!(strings.value(0), "9");
        assert_eq!(strings.value(1), r#"{"b":10}"#);
    }
}

#[test]
fn test_multiple_rows_with_mixed_outcomes() {
    let docs: Vec<Option<Value>> = vec![
        Some(json!({"k": "v"})),
        Some(json!([1, 2, 3])),
        Some(json!(null)),
        Some(json!({"k": {"deep": true}})),
    ];
    let paths = StringArray::from(vec!["$.k", "$[2]", "$", "$.k"]);
    let output = query(&docs, &paths);
    assert_eq!(
        rendered(&output),
        vec![
            Some("\"v\"".to_string()),
            Some("3".to_string()),
            None,
            Some(r#"{"deep":true}"#.to_string()),
        ]
    );
}

#[test]
fn test_const_columns_collapse_to_scalar() {
    let variants = Scalar::new(variant_column(&[Some(json!({"a": [7]}))]));
    let path = Scalar::new(StringArray::from(vec!["$.a[0]"]));
    let args: [&dyn Datum; 2] = [&variants, &path];
    let output = variant_query(&args).unwrap();
    assert!(output.is_scalar());
    assert_eq!(rendered(&output), vec![Some("7".to_string())]);

    // A constant path broadcast over a column.
    let column = variant_column(&[Some(json!({"a": [1]})), Some(json!({"a": []}))]);
    let args: [&dyn Datum; 2] = [&column, &path];
    let output = variant_query(&args).unwrap();
    assert!(!output.is_scalar());
    assert_eq!(rendered(&output), vec![Some("1".to_string()), None]);
}

#[test]
fn test_typed_results() {
    let docs = [Some(json!({"n": 5, "s": "12", "b": "true", "o": {"x": 1}}))];
    let variants = variant_column(&docs);

    let run = |path: &str, result_type: DataType| -> ArrayRef {
        let paths = StringArray::from(vec![path]);
        variant_query_as(&variants, &paths, &result_type, utc_config())
            .unwrap()
            .into_array()
    };

    assert_eq!(run("$.n", DataType::Int32).as_primitive::<Int32Type>().value(0), 5);
    assert_eq!(run("$.n", DataType::Int64).as_primitive::<Int64Type>().value(0), 5);
    assert!(run("$.b", DataType::Boolean).as_boolean().value(0));
    assert!(run("$.s", DataType::Boolean).as_boolean().value(0));
    assert_eq!(run("$.o", DataType::Utf8).as_string::<i32>().value(0), r#"{"x":1}"#);
    assert_eq!(run("$.s", DataType::Utf8).as_string::<i32>().value(0), "12");
    // Strings are not numeric sources, so the soft policy yields null.
    assert!(run("$.s", DataType::Int32).is_null(0));
}

#[test]
fn test_strict_mode_reports_cast_failure() {
    let variants = variant_column(&[Some(json!({"s": "abc"}))]);
    let paths = StringArray::from(vec!["$.s"]);
    let strict = Arc::new(VariantQueryConfig {
        cast_mode: CastMode::Strict,
        ..Default::default()
    });
    let result = variant_query_as(&variants, &paths, &DataType::Int64, strict);
    assert!(matches!(result, Err(VariantError::UnsupportedCast(_))));
}

#[test]
fn test_struct_input_column() {
    let doc = encode_json(&json!({"name": "struct"})).unwrap();
    let metadata = BinaryArray::from(vec![Some(doc.metadata())]);
    let value = BinaryArray::from(vec![Some(doc.value())]);
    let variants = StructArray::from(vec![
        (
            Arc::new(Field::new("metadata", DataType::Binary, true)),
            Arc::new(metadata) as ArrayRef,
        ),
        (
            Arc::new(Field::new("value", DataType::Binary, true)),
            Arc::new(value) as ArrayRef,
        ),
    ]);
    let paths = StringArray::from(vec!["$.name"]);
    let output = variant_query_as(&variants, &paths, &DataType::Utf8, utc_config()).unwrap();
    assert_eq!(output.array().as_string::<i32>().value(0), "struct");
}

#[test]
fn test_malformed_rows_become_null() {
    let good = encode_json(&json!({"a": 1})).unwrap().serialize();
    let truncated = good[..6].to_vec();
    let garbage = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x01];
    let variants = BinaryArray::from_iter_values([good, truncated, garbage]);
    let paths = Scalar::new(StringArray::from(vec!["$.a"]));
    let output =
        variant_query_as(&variants, &paths, &DataType::Int64, utc_config()).unwrap();
    let ints = output.array().as_primitive::<Int64Type>();
    assert_eq!(ints.value(0), 1);
    assert!(ints.is_null(1));
    assert!(ints.is_null(2));
}

#[test]
fn test_fragment_reuses_cache_across_batches() {
    let placeholder = StringArray::from(vec!["$"]);
    let mut fragment =
        VariantQueryFragment::prepare(&placeholder, QueryResultType::Utf8, utc_config()).unwrap();

    for _ in 0..3 {
        let variants = variant_column(&[Some(json!({"a": "x"})), Some(json!({"b": "y"}))]);
        let paths = StringArray::from(vec!["$.a", "$.b"]);
        let output = fragment.evaluate(&variants, &paths).unwrap();
        let strings = output.array().as_string::<i32>();
        assert_eq!((strings.value(0), strings.value(1)), ("x", "y"));
    }

    let stats = fragment.close();
    assert_eq!(stats.rows, 6);
    assert_eq!(stats.cache_misses, 2);
    assert_eq!(stats.cache_hits, 4);
    assert_eq!(stats.cached_paths, 2);
}
