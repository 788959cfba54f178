// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the Arrow-facing boundary of the variant query library. The
// decoder, path parser, seek engine and caster below it know nothing about
// columns; the bridge turns Arrow arguments into per-row cells and collects the
// per-row results back into an Arrow column.
//
// Data Flow (one batch):
//
//   1. [Stateless API (variant_query / variant_query_as)] -> Receives `&dyn Datum` args
//         |
//         `-> a. Validates the argument count and result type (fatal on failure)
//         |
//         `-> b. Prepares a one-shot `VariantQueryFragment`
//
//   2. [Fragment (query::fragment)] -> Owns the constant path or the `PathCache`
//         |
//         `-> a. Calls `arrow_impl` to wrap the columns as `VariantColumn` / `PathColumn`
//         |
//         `-> b. Per row: resolve path -> seek -> cast (row failures become null)
//         |
//         `-> c. Calls `arrow_impl::ResultColumnBuilder` to seal the output
//
//   3. [QueryOutput] -> An `ArrayRef`, reported as a scalar when every input was a scalar
//
// Engines that run many batches per fragment use `VariantQueryFragment`
// directly so the parsed paths survive across batches.
//
// ====================================================================================
pub(crate) mod arrow_impl;
pub mod stateless_api;

pub use stateless_api::{variant_query, variant_query_as};

#[cfg(test)]
mod tests;
