//! This module defines the canonical, type-safe representation of the output
//! types a variant query can produce.

use crate::error::VariantError;
use arrow::datatypes::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The output type requested for a variant query.
///
/// `Variant` is a pass-through: the addressed sub-value is repackaged as a
/// serialized `VariantValue` and stored in a `Binary` column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueryResultType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Variant,
}

impl QueryResultType {
    /// Converts an Arrow `DataType` into a `QueryResultType`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, VariantError> {
        match arrow_type {
            ArrowDataType::Boolean => Ok(Self::Boolean),
            ArrowDataType::Int8 => Ok(Self::Int8),
            ArrowDataType::Int16 => Ok(Self::Int16),
            ArrowDataType::Int32 => Ok(Self::Int32),
            ArrowDataType::Int64 => Ok(Self::Int64),
            ArrowDataType::Float32 => Ok(Self::Float32),
            ArrowDataType::Float64 => Ok(Self::Float64),
            ArrowDataType::Utf8 => Ok(Self::Utf8),
            ArrowDataType::Binary => Ok(Self::Variant),
            dt => Err(VariantError::InvalidArgument(format!(
                "Unsupported result type for variant query: {:?}",
                dt
            ))),
        }
    }

    /// Converts a `QueryResultType` back into the Arrow `DataType` of the output column.
    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::Boolean => ArrowDataType::Boolean,
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::Utf8 => ArrowDataType::Utf8,
            Self::Variant => ArrowDataType::Binary,
        }
    }
}

impl fmt::Display for QueryResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
