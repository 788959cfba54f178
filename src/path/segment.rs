//! The parsed form of a path expression.

use std::fmt;
use std::str::FromStr;

use crate::error::PathParseError;
use crate::path::parser::parse_path;

/// One step of a path: an object member lookup or an array element lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    ObjectExtraction { key: String },
    ArrayExtraction { index: usize },
}

impl PathSegment {
    pub fn key(key: impl Into<String>) -> Self {
        PathSegment::ObjectExtraction { key: key.into() }
    }

    pub fn index(index: usize) -> Self {
        PathSegment::ArrayExtraction { index }
    }
}

/// The segments following the root anchor `$`, in application order.
/// An empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParsedPath(Vec<PathSegment>);

impl ParsedPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for ParsedPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::ArrayExtraction { index } => write!(f, "[{}]", index),
            PathSegment::ObjectExtraction { key } if is_plain_key(key) => write!(f, ".{}", key),
            PathSegment::ObjectExtraction { key } => {
                f.write_str("['")?;
                for c in key.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("']")
            }
        }
    }
}

/// Renders the canonical form, which parses back to an equal path.
impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for ParsedPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}
