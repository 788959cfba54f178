//! Canonical, type-safe representation of the type tag carried in the first
//! byte of every Variant value buffer.
//!
//! A value header is laid out as `[type_info:6][basic_type:2]`. For primitives
//! `type_info` is a primitive id, for short strings it is the byte length, and
//! for objects/arrays it packs the offset and id widths.

use std::fmt;

use crate::error::VariantError;

/// The 2-bit basic type stored in the low bits of a value header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Primitive,
    ShortString,
    Object,
    Array,
}

impl BasicType {
    pub const MASK: u8 = 0b11;

    pub fn from_header(header: u8) -> Self {
        match header & Self::MASK {
            0 => Self::Primitive,
            1 => Self::ShortString,
            2 => Self::Object,
            _ => Self::Array,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Primitive => 0,
            Self::ShortString => 1,
            Self::Object => 2,
            Self::Array => 3,
        }
    }
}

/// Primitive ids defined by the Variant encoding.
pub mod primitive_id {
    pub const NULL: u8 = 0;
    pub const TRUE: u8 = 1;
    pub const FALSE: u8 = 2;
    pub const INT8: u8 = 3;
    pub const INT16: u8 = 4;
    pub const INT32: u8 = 5;
    pub const INT64: u8 = 6;
    pub const DOUBLE: u8 = 7;
    pub const DECIMAL4: u8 = 8;
    pub const DECIMAL8: u8 = 9;
    pub const DECIMAL16: u8 = 10;
    pub const DATE: u8 = 11;
    pub const TIMESTAMP_TZ: u8 = 12;
    pub const TIMESTAMP_NTZ: u8 = 13;
    pub const FLOAT: u8 = 14;
    pub const BINARY: u8 = 15;
    pub const STRING: u8 = 16;
    pub const TIME_NTZ: u8 = 17;
    pub const TIMESTAMP_NANOS_TZ: u8 = 18;
    pub const TIMESTAMP_NANOS_NTZ: u8 = 19;
    pub const UUID: u8 = 20;
}

/// The logical type of a Variant value, derived from its header byte.
///
/// Short strings and long strings share the `String` discriminant; only the
/// decoder cares about the physical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal4,
    Decimal8,
    Decimal16,
    Date,
    TimestampTz,
    TimestampNtz,
    TimestampNanosTz,
    TimestampNanosNtz,
    TimeNtz,
    Binary,
    String,
    Uuid,
    Object,
    Array,
}

impl VariantType {
    /// Decodes the logical type from a value header byte.
    pub fn from_header(header: u8) -> Result<Self, VariantError> {
        match BasicType::from_header(header) {
            BasicType::ShortString => Ok(Self::String),
            BasicType::Object => Ok(Self::Object),
            BasicType::Array => Ok(Self::Array),
            BasicType::Primitive => Self::from_primitive_id(header >> 2),
        }
    }

    fn from_primitive_id(id: u8) -> Result<Self, VariantError> {
        use primitive_id::*;
        Ok(match id {
            NULL => Self::Null,
            TRUE | FALSE => Self::Boolean,
            INT8 => Self::Int8,
            INT16 => Self::Int16,
            INT32 => Self::Int32,
            INT64 => Self::Int64,
            DOUBLE => Self::Double,
            DECIMAL4 => Self::Decimal4,
            DECIMAL8 => Self::Decimal8,
            DECIMAL16 => Self::Decimal16,
            DATE => Self::Date,
            TIMESTAMP_TZ => Self::TimestampTz,
            TIMESTAMP_NTZ => Self::TimestampNtz,
            FLOAT => Self::Float,
            BINARY => Self::Binary,
            STRING => Self::String,
            TIME_NTZ => Self::TimeNtz,
            TIMESTAMP_NANOS_TZ => Self::TimestampNanosTz,
            TIMESTAMP_NANOS_NTZ => Self::TimestampNanosNtz,
            UUID => Self::Uuid,
            other => {
                return Err(VariantError::decode(format!(
                    "Unknown primitive type id {}",
                    other
                )))
            }
        })
    }

    /// Returns `true` for the integer family (Int8 through Int64).
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_headers() {
        assert_eq!(VariantType::from_header(0).unwrap(), VariantType::Null);
        assert_eq!(VariantType::from_header(1 << 2).unwrap(), VariantType::Boolean);
        assert_eq!(VariantType::from_header(2 << 2).unwrap(), VariantType::Boolean);
        assert_eq!(VariantType::from_header(3 << 2).unwrap(), VariantType::Int8);
        assert_eq!(VariantType::from_header(14 << 2).unwrap(), VariantType::Float);
        assert_eq!(VariantType::from_header(16 << 2).unwrap(), VariantType::String);
        assert_eq!(VariantType::from_header(20 << 2).unwrap(), VariantType::Uuid);
    }

    #[test]
    fn test_non_primitive_headers_ignore_type_info() {
        // Short string of length 5.
        assert_eq!(VariantType::from_header((5 << 2) | 1).unwrap(), VariantType::String);
        assert_eq!(VariantType::from_header(0b0001_0110).unwrap(), VariantType::Object);
        assert_eq!(VariantType::from_header(0b0000_0111).unwrap(), VariantType::Array);
    }

    #[test]
    fn test_unknown_primitive_id_is_decode_error() {
        let result = VariantType::from_header(21 << 2);
        assert!(matches!(result, Err(VariantError::Decode(_))));
    }
}
