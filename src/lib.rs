//! This file is the root of the `variant_query` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`variant`, `path`,
//!     `cast`, `query`, `bridge`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the public surface used by query engines: the two
//!     stateless entry points, the per-fragment evaluator and the value types.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod cast;
pub mod config;
pub mod error;
pub mod path;
pub mod query;
pub mod types;
pub mod variant;

mod traits;
mod utils;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use bridge::{variant_query, variant_query_as};
pub use cast::{cast_variant, cast_with_mode, CastValue};
pub use config::{CastMode, VariantQueryConfig};
pub use error::{PathParseError, VariantError};
pub use observability::enable_verbose_logging;
pub use path::{parse_path, seek, ParsedPath, PathSegment};
pub use query::{FragmentStats, PathCache, QueryOutput, VariantQueryFragment};
pub use types::{QueryResultType, VariantType};
pub use variant::{encode_json, Variant, VariantEncoder, VariantValue};
