//! The query cache and the fragment evaluator that drives the decoder, path
//! parser, seek engine and caster over whole batches.

pub mod cache;
pub mod fragment;

pub use cache::PathCache;
pub use fragment::{FragmentStats, QueryOutput, VariantQueryFragment};
