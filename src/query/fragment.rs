// In: src/query/fragment.rs

//! The stateful, per-fragment query evaluator.
//!
//! A `VariantQueryFragment` is created once per scheduled fragment, evaluates
//! any number of batches strictly in order on its owning thread, and is
//! consumed by `close()`. It chooses between two path sources at setup time:
//!
//!   - a constant path argument is parsed once in `prepare` and shared by
//!     every row of every batch;
//!   - otherwise each row's path text is resolved through the fragment's own
//!     `PathCache`.
//!
//! Both sources feed the same seek and cast steps.

use std::sync::Arc;

use arrow::array::{new_null_array, Array, ArrayRef, Datum};
use chrono::FixedOffset;
use log::{debug, trace};
use serde::Serialize;

use crate::bridge::arrow_impl::{PathColumn, ResultColumnBuilder, VariantColumn};
use crate::cast::{cast_with_mode, CastValue};
use crate::config::VariantQueryConfig;
use crate::error::{PathParseError, VariantError};
use crate::path::{parse_path, seek, ParsedPath};
use crate::query::cache::PathCache;
use crate::types::QueryResultType;
use crate::variant::Variant;

/// Counters reported when a fragment is closed.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentStats {
    pub rows: u64,
    pub null_rows: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cached_paths: usize,
    pub constant_path: bool,
}

/// The result column of one evaluated batch.
///
/// When every input was a scalar the output holds a single row and reports
/// itself as a scalar through `Datum`.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    array: ArrayRef,
    is_scalar: bool,
}

impl QueryOutput {
    pub fn new(array: ArrayRef, is_scalar: bool) -> Self {
        Self { array, is_scalar }
    }

    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    pub fn into_array(self) -> ArrayRef {
        self.array
    }

    pub fn is_scalar(&self) -> bool {
        self.is_scalar
    }
}

impl Datum for QueryOutput {
    fn get(&self) -> (&dyn Array, bool) {
        (self.array.as_ref(), self.is_scalar)
    }
}

/// A path argument that was a scalar at preparation time, kept with its text
/// so later batches can confirm they carry the same constant.
#[derive(Debug)]
struct ConstantPath {
    text: String,
    parsed: Result<Arc<ParsedPath>, PathParseError>,
}

#[derive(Debug)]
pub struct VariantQueryFragment {
    result_type: QueryResultType,
    config: Arc<VariantQueryConfig>,
    timezone: FixedOffset,
    constant_path: Option<ConstantPath>,
    cache: PathCache,
    stats: FragmentStats,
}

impl VariantQueryFragment {
    /// Validates the path argument and, if it is a non-null scalar, parses it
    /// once for the lifetime of the fragment.
    pub fn prepare(
        path_arg: &dyn Datum,
        result_type: QueryResultType,
        config: Arc<VariantQueryConfig>,
    ) -> Result<Self, VariantError> {
        let (path_array, is_scalar) = path_arg.get();
        let paths = PathColumn::try_new(path_array)?;
        let timezone = config.resolve_timezone()?;

        let constant_path = if is_scalar && !path_array.is_empty() {
            paths.get(0).map(|text| ConstantPath {
                text: text.to_string(),
                parsed: parse_path(text).map(Arc::new),
            })
        } else {
            None
        };
        if let Some(ConstantPath { parsed: Err(e), .. }) = &constant_path {
            debug!("Constant path is invalid, every row will be null: {}", e);
        }
        debug!(
            "Prepared variant query fragment: result_type={}, constant_path={}",
            result_type,
            constant_path.is_some()
        );

        Ok(Self {
            result_type,
            cache: PathCache::from_config(&config),
            stats: FragmentStats {
                constant_path: constant_path.is_some(),
                ..Default::default()
            },
            config,
            timezone,
            constant_path,
        })
    }

    pub fn result_type(&self) -> QueryResultType {
        self.result_type
    }

    /// Evaluates one batch. Scalar inputs are broadcast against array inputs.
    ///
    /// Row-level failures become null rows. Only setup problems (unsupported
    /// column types, mismatched lengths) and strict-mode cast failures are
    /// returned as errors.
    pub fn evaluate(
        &mut self,
        variants: &dyn Datum,
        paths: &dyn Datum,
    ) -> Result<QueryOutput, VariantError> {
        let (variant_array, variants_scalar) = variants.get();
        let (path_array, paths_scalar) = paths.get();
        let variant_column = VariantColumn::try_new(variant_array)?;
        let path_column = PathColumn::try_new(path_array)?;
        let num_rows = batch_len(
            (variant_array.len(), variants_scalar),
            (path_array.len(), paths_scalar),
        )?;
        let is_scalar = variants_scalar && paths_scalar;

        if variant_column.is_null_type() || path_column.is_null_type() {
            self.stats.rows += num_rows as u64;
            self.stats.null_rows += num_rows as u64;
            let array = new_null_array(&self.result_type.to_arrow_type(), num_rows);
            return Ok(QueryOutput::new(array, is_scalar));
        }

        // A scalar path with different text from the prepared one goes through the cache.
        let use_constant = paths_scalar
            && match (&self.constant_path, path_column.get(0)) {
                (Some(constant), Some(text)) => constant.text == text,
                _ => false,
            };
        let mut builder = ResultColumnBuilder::new(self.result_type, num_rows);
        for row in 0..num_rows {
            let variant = variant_column.get(if variants_scalar { 0 } else { row });
            let path = path_column.get(if paths_scalar { 0 } else { row });
            let value = self.evaluate_row(variant, path, use_constant)?;
            if value.is_null() {
                self.stats.null_rows += 1;
            }
            builder.append(value)?;
        }
        self.stats.rows += num_rows as u64;

        Ok(QueryOutput::new(builder.finish(), is_scalar))
    }

    /// A snapshot of the counters so far.
    pub fn stats(&self) -> FragmentStats {
        FragmentStats {
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            cached_paths: self.cache.len(),
            ..self.stats.clone()
        }
    }

    /// Tears the fragment down, releasing the constant path and the cache.
    pub fn close(self) -> FragmentStats {
        let stats = self.stats();
        log_metric!(
            "event" = "variant_query_fragment_closed",
            "rows" = stats.rows,
            "null_rows" = stats.null_rows,
            "cache_hits" = stats.cache_hits,
            "cache_misses" = stats.cache_misses,
            "cached_paths" = stats.cached_paths,
            "constant_path" = stats.constant_path
        );
        debug!("Closed variant query fragment after {} rows", stats.rows);
        stats
    }

    //------------------------------------------------------------------------------
    // Per-row pipeline
    //------------------------------------------------------------------------------

    fn evaluate_row<'a>(
        &mut self,
        variant: Option<Result<Variant<'a>, VariantError>>,
        path_text: Option<&str>,
        use_constant: bool,
    ) -> Result<CastValue<'a>, VariantError> {
        let (Some(variant), Some(path_text)) = (variant, path_text) else {
            return Ok(CastValue::Null);
        };

        let resolved = match (&self.constant_path, use_constant) {
            (Some(constant), true) => constant.parsed.clone(),
            _ => self.cache.resolve(path_text),
        };
        let path = match resolved {
            Ok(path) => path,
            Err(e) => {
                trace!("Row path '{}' rejected: {}", path_text, e);
                return Ok(CastValue::Null);
            }
        };

        let target = match variant.and_then(|root| seek(root, &path)) {
            Ok(target) => target,
            Err(e) if e.is_row_recoverable() => {
                trace!("Row skipped at path '{}': {}", path_text, e);
                return Ok(CastValue::Null);
            }
            Err(e) => return Err(e),
        };

        cast_with_mode(&target, self.result_type, &self.timezone, self.config.cast_mode)
    }
}

/// Resolves the row count of a batch from its two `(len, is_scalar)` inputs.
fn batch_len(variants: (usize, bool), paths: (usize, bool)) -> Result<usize, VariantError> {
    for (name, (len, is_scalar)) in [("Variant", variants), ("Path", paths)] {
        if is_scalar && len != 1 {
            return Err(VariantError::InvalidArgument(format!(
                "{} scalar argument must hold exactly one row, got {}",
                name, len
            )));
        }
    }
    match (variants, paths) {
        ((_, true), (_, true)) => Ok(1),
        ((len, false), (_, true)) | ((_, true), (len, false)) => Ok(len),
        ((a, false), (b, false)) if a == b => Ok(a),
        ((a, false), (b, false)) => Err(VariantError::InvalidArgument(format!(
            "Variant and path columns differ in length: {} vs {}",
            a, b
        ))),
    }
}
