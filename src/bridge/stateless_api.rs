// In: src/bridge/stateless_api.rs

use std::sync::Arc;

use arrow::array::Datum;
use arrow::datatypes::DataType;

use crate::config::VariantQueryConfig;
use crate::error::VariantError;
use crate::query::{QueryOutput, VariantQueryFragment};
use crate::types::QueryResultType;

/// Evaluates `variant_query(variant, path)` over one batch, producing
/// serialized Variant values (a `Binary` column).
///
/// Exactly two arguments are accepted. Since this is a stateless API, the
/// default configuration is used.
pub fn variant_query(args: &[&dyn Datum]) -> Result<QueryOutput, VariantError> {
    let [variant, path] = args else {
        return Err(VariantError::InvalidArgument(format!(
            "variant_query expects exactly 2 arguments, got {}",
            args.len()
        )));
    };
    variant_query_as(
        *variant,
        *path,
        &DataType::Binary,
        Arc::new(VariantQueryConfig::default()),
    )
}

/// Evaluates a typed variant query over one batch.
///
/// `result_type` is the Arrow type of the output column; `Binary` requests
/// pass-through Variant values. Unsupported types are rejected before any row
/// is read.
pub fn variant_query_as(
    variant: &dyn Datum,
    path: &dyn Datum,
    result_type: &DataType,
    config: Arc<VariantQueryConfig>,
) -> Result<QueryOutput, VariantError> {
    // 1. Resolve the output type up front.
    let result_type = QueryResultType::from_arrow_type(result_type)?;

    // 2. A one-shot fragment: constant paths are parsed once, varying paths are cached.
    let mut fragment = VariantQueryFragment::prepare(path, result_type, config)?;
    let output = fragment.evaluate(variant, path)?;
    fragment.close();
    Ok(output)
}
