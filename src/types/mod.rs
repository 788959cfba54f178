//! This module defines the core, strongly-typed data representations used
//! throughout the variant query pipeline.
//!
//! It includes the `VariantType` discriminant decoded from a value header and
//! the `QueryResultType` enum describing which output column a query produces.

pub mod query_result_type;
pub mod variant_type;

// Re-export the main type(s) for easier access.
pub use query_result_type::QueryResultType;
pub use variant_type::{BasicType, VariantType};
