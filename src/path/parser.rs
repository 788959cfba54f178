//! Recursive-descent parser for path expressions.
//!
//! Grammar:
//! ```text
//! path          = "$" { segment }
//! segment       = "." unquoted_key
//!               | "[" ( digits | "'" text "'" | '"' text '"' ) "]"
//! unquoted_key  = ( ASCII letter | digit | "_" )+
//! ```
//! At a `[` the index form is tried first; if it fails the cursor is rewound
//! and the quoted-key form is tried from the same position. The whole input
//! must be consumed for a parse to succeed.

use crate::error::PathParseError;
use crate::path::segment::{ParsedPath, PathSegment};

/// Parses `path` into its segments.
pub fn parse_path(path: &str) -> Result<ParsedPath, PathParseError> {
    PathParser::new(path).parse()
}

pub struct PathParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> PathParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<ParsedPath, PathParseError> {
        if !self.eat(b'$') {
            return Err(PathParseError::new(0, "Path must start with '$'"));
        }

        let mut segments = Vec::new();
        while !self.is_at_end() {
            segments.push(self.parse_segment()?);
        }
        Ok(ParsedPath::new(segments))
    }

    //------------------------------------------------------------------------------
    // Cursor primitives
    //------------------------------------------------------------------------------

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(b) => format!("'{}'", char::from(b)),
            None => "end of input".to_string(),
        }
    }

    //------------------------------------------------------------------------------
    // Productions
    //------------------------------------------------------------------------------

    fn parse_segment(&mut self) -> Result<PathSegment, PathParseError> {
        match self.peek() {
            Some(b'.') => self.parse_object_key(),
            Some(b'[') => {
                let saved = self.pos;
                let index_error = match self.parse_array_index() {
                    Ok(segment) => return Ok(segment),
                    Err(e) => e,
                };

                self.pos = saved;
                match self.parse_quoted_key() {
                    Ok(segment) => Ok(segment),
                    Err(quoted_error) => {
                        // Report whichever form the bracket was evidently meant to be.
                        let quoted = matches!(self.input.get(saved + 1), Some(b'\'' | b'"'));
                        self.pos = saved;
                        Err(if quoted { quoted_error } else { index_error })
                    }
                }
            }
            _ => Err(PathParseError::new(
                self.pos,
                format!("Unexpected character {}", self.describe_current()),
            )),
        }
    }

    fn parse_object_key(&mut self) -> Result<PathSegment, PathParseError> {
        if !self.eat(b'.') {
            return Err(PathParseError::new(self.pos, "Expected '.'"));
        }
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(PathParseError::new(self.pos, "Expected key after '.'"));
        }
        let key = self.text(start, self.pos)?;
        Ok(PathSegment::ObjectExtraction { key })
    }

    fn parse_array_index(&mut self) -> Result<PathSegment, PathParseError> {
        if !self.eat(b'[') {
            return Err(PathParseError::new(self.pos, "Expected '['"));
        }
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(PathParseError::new(self.pos, "Expected array index after '['"));
        }
        let digits = self.text(start, self.pos)?;
        if !self.eat(b']') {
            return Err(PathParseError::new(
                self.pos,
                format!("Expected ']' after array index '{}'", digits),
            ));
        }
        let index = digits.parse::<usize>().map_err(|_| {
            PathParseError::new(start, format!("Invalid array index '{}'", digits))
        })?;
        Ok(PathSegment::ArrayExtraction { index })
    }

    fn parse_quoted_key(&mut self) -> Result<PathSegment, PathParseError> {
        if !self.eat(b'[') {
            return Err(PathParseError::new(self.pos, "Expected '['"));
        }
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => {
                return Err(PathParseError::new(
                    self.pos,
                    format!("Expected quote (\" or ') but found {}", self.describe_current()),
                ))
            }
        };
        self.pos += 1;

        let key = self.parse_quoted_string(quote)?;
        if !self.eat(quote) {
            return Err(PathParseError::new(
                self.pos,
                format!("Expected closing quote '{}'", char::from(quote)),
            ));
        }
        if !self.eat(b']') {
            return Err(PathParseError::new(
                self.pos,
                format!("Expected ']' after quoted key '{}'", key),
            ));
        }
        Ok(PathSegment::ObjectExtraction { key })
    }

    /// Reads up to (not including) the closing `quote`. Recognized escapes are
    /// `\'`, `\"`, `\\`, `\n`, `\t` and `\r`; any other escaped byte is kept as is.
    fn parse_quoted_string(&mut self, quote: u8) -> Result<String, PathParseError> {
        let start = self.pos;
        let mut bytes = Vec::new();
        while let Some(b) = self.peek() {
            if b == quote {
                break;
            }
            self.pos += 1;
            if b == b'\\' {
                match self.advance() {
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(b'r') => bytes.push(b'\r'),
                    Some(other) => bytes.push(other),
                    None => bytes.push(b'\\'),
                }
            } else {
                bytes.push(b);
            }
        }
        String::from_utf8(bytes)
            .map_err(|_| PathParseError::new(start, "Quoted key is not valid UTF-8"))
    }

    fn text(&self, start: usize, end: usize) -> Result<String, PathParseError> {
        std::str::from_utf8(&self.input[start..end])
            .map(str::to_string)
            .map_err(|_| PathParseError::new(start, "Path is not valid UTF-8"))
    }
}
