// In variant-query-core/benches/variant_query_bench.rs

use std::sync::Arc;

use arrow::array::{BinaryArray, Datum, Scalar, StringArray};
use arrow::datatypes::DataType;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use variant_query::{encode_json, parse_path, variant_query_as, VariantQueryConfig};

// --- Mock Data Generation ---

const BENCH_ROWS: usize = 8192;

const PATHS: [&str; 4] = [
    "$.user.id",
    "$.user.tags[1]",
    "$['events'][0].kind",
    "$.missing.field",
];

/// Generates a column of small nested documents with random ids and tag counts.
fn generate_variant_column(rows: usize, rng: &mut StdRng) -> BinaryArray {
    let docs = (0..rows).map(|_| {
        let tags: Vec<String> = (0..rng.random_range(0..4))
            .map(|t| format!("tag{}", t))
            .collect();
        let doc = json!({
            "user": {"id": rng.random_range(0..1_000_000i64), "tags": tags},
            "events": [{"kind": "click", "ts": rng.random_range(0..86_400)}],
        });
        encode_json(&doc).unwrap().serialize()
    });
    BinaryArray::from_iter_values(docs)
}

/// Generates a per-row path column drawn from a small set of distinct paths.
fn generate_path_column(rows: usize, rng: &mut StdRng) -> StringArray {
    StringArray::from_iter_values((0..rows).map(|_| PATHS[rng.random_range(0..PATHS.len())]))
}

// --- Benchmark Suite ---

fn bench_variant_query(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let variants = generate_variant_column(BENCH_ROWS, &mut rng);
    let varying_paths = generate_path_column(BENCH_ROWS, &mut rng);
    let constant_path = Scalar::new(StringArray::from(vec![PATHS[0]]));
    let config = Arc::new(VariantQueryConfig::default());

    let mut group = c.benchmark_group("Variant Query");
    group.throughput(criterion::Throughput::Elements(BENCH_ROWS as u64));

    group.bench_function("Parse [1] Path Grammar", |b| {
        b.iter(|| {
            for path in PATHS {
                let _ = black_box(parse_path(black_box(path)));
            }
        })
    });

    for (label, result_type) in [("Int64", DataType::Int64), ("Variant", DataType::Binary)] {
        group.bench_function(format!("Query [2] Constant Path ({})", label), |b| {
            b.iter(|| {
                black_box(variant_query_as(
                    &variants,
                    &constant_path as &dyn Datum,
                    &result_type,
                    config.clone(),
                ))
            })
        });
        group.bench_function(format!("Query [3] Per-Row Paths ({})", label), |b| {
            b.iter(|| {
                black_box(variant_query_as(
                    &variants,
                    &varying_paths,
                    &result_type,
                    config.clone(),
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_variant_query);
criterion_main!(benches);
