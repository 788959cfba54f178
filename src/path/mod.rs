//! Path expressions: the segment model, the parser that produces it, and the
//! seek engine that applies it to a Variant.

pub mod parser;
pub mod seek;
pub mod segment;

pub use parser::{parse_path, PathParser};
pub use seek::seek;
pub use segment::{ParsedPath, PathSegment};
