//! The Variant decoder: zero-copy views over `(metadata, value)` buffer pairs,
//! the owned serialized form, and the JSON writer and encoder built on them.

pub mod encoder;
pub mod json;
pub mod metadata;
pub mod owned;
pub mod value;

pub use encoder::{encode_json, VariantEncoder};
pub use metadata::VariantMetadata;
pub use owned::{load_metadata_len, VariantValue};
pub use value::{Variant, VariantDecimal};
