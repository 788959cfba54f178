// In: src/bridge/arrow_impl.rs

//! DATA MARSHALLING between Arrow columns and the pure query core.
//!
//! Input columns are wrapped in borrowed views that hand out one cell per row
//! (`VariantColumn`, `PathColumn`); output cells are collected by a
//! `ResultColumnBuilder` and sealed into an `ArrayRef`.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder,
    Int16Builder, Int32Builder, Int64Builder, Int8Builder, LargeBinaryArray, LargeStringArray,
    StringArray, StringBuilder, StringViewArray, StructArray,
};
use arrow::datatypes::DataType;

use crate::cast::CastValue;
use crate::error::VariantError;
use crate::types::QueryResultType;
use crate::variant::{Variant, VariantValue};

//==================================================================================
// 1. Variant Input Column
//==================================================================================

/// A non-null binary column of either offset width.
#[derive(Debug, Clone, Copy)]
pub enum BinaryColumn<'a> {
    Binary(&'a BinaryArray),
    LargeBinary(&'a LargeBinaryArray),
}

impl<'a> BinaryColumn<'a> {
    fn try_new(array: &'a dyn Array, what: &str) -> Result<Self, VariantError> {
        match array.data_type() {
            DataType::Binary => downcast::<BinaryArray>(array).map(Self::Binary),
            DataType::LargeBinary => downcast::<LargeBinaryArray>(array).map(Self::LargeBinary),
            dt => Err(VariantError::InvalidArgument(format!(
                "{} must be Binary or LargeBinary, got {:?}",
                what, dt
            ))),
        }
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            Self::Binary(a) => a.is_null(row),
            Self::LargeBinary(a) => a.is_null(row),
        }
    }

    fn value(&self, row: usize) -> &'a [u8] {
        match *self {
            Self::Binary(a) => a.value(row),
            Self::LargeBinary(a) => a.value(row),
        }
    }
}

/// The Variant argument of a query, in one of its accepted physical layouts.
#[derive(Debug, Clone, Copy)]
pub enum VariantColumn<'a> {
    /// Each cell holds a serialized `VariantValue`.
    Serialized(BinaryColumn<'a>),
    /// Separate `metadata` and `value` children, as written by Parquet readers.
    Shredded {
        parent: &'a StructArray,
        metadata: BinaryColumn<'a>,
        value: BinaryColumn<'a>,
    },
    /// An untyped all-null argument.
    Null,
}

impl<'a> VariantColumn<'a> {
    pub fn try_new(array: &'a dyn Array) -> Result<Self, VariantError> {
        match array.data_type() {
            DataType::Null => Ok(Self::Null),
            DataType::Binary | DataType::LargeBinary => {
                BinaryColumn::try_new(array, "Variant column").map(Self::Serialized)
            }
            DataType::Struct(_) => {
                let parent = downcast::<StructArray>(array)?;
                let child = |name: &str| {
                    parent.column_by_name(name).ok_or_else(|| {
                        VariantError::InvalidArgument(format!(
                            "Variant struct column has no '{}' child",
                            name
                        ))
                    })
                };
                Ok(Self::Shredded {
                    parent,
                    metadata: BinaryColumn::try_new(child("metadata")?.as_ref(), "Variant metadata")?,
                    value: BinaryColumn::try_new(child("value")?.as_ref(), "Variant value")?,
                })
            }
            dt => Err(VariantError::InvalidArgument(format!(
                "Unsupported Variant column type: {:?}",
                dt
            ))),
        }
    }

    pub fn is_null_type(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `None` for a null cell, otherwise the decoded root view.
    pub fn get(&self, row: usize) -> Option<Result<Variant<'a>, VariantError>> {
        match *self {
            Self::Null => None,
            Self::Serialized(column) => {
                if column.is_null(row) {
                    return None;
                }
                Some(VariantValue::view(column.value(row)))
            }
            Self::Shredded {
                parent,
                metadata,
                value,
            } => {
                if parent.is_null(row) || metadata.is_null(row) || value.is_null(row) {
                    return None;
                }
                Some(Variant::try_new(metadata.value(row), value.value(row)))
            }
        }
    }
}

//==================================================================================
// 2. Path Input Column
//==================================================================================

#[derive(Debug, Clone, Copy)]
pub enum PathColumn<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
    Utf8View(&'a StringViewArray),
    Null,
}

impl<'a> PathColumn<'a> {
    pub fn try_new(array: &'a dyn Array) -> Result<Self, VariantError> {
        match array.data_type() {
            DataType::Null => Ok(Self::Null),
            DataType::Utf8 => downcast::<StringArray>(array).map(Self::Utf8),
            DataType::LargeUtf8 => downcast::<LargeStringArray>(array).map(Self::LargeUtf8),
            DataType::Utf8View => downcast::<StringViewArray>(array).map(Self::Utf8View),
            dt => Err(VariantError::InvalidArgument(format!(
                "Path column must be a string type, got {:?}",
                dt
            ))),
        }
    }

    pub fn is_null_type(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `None` for a null cell.
    pub fn get(&self, row: usize) -> Option<&'a str> {
        match *self {
            Self::Null => None,
            Self::Utf8(a) => (!a.is_null(row)).then(|| a.value(row)),
            Self::LargeUtf8(a) => (!a.is_null(row)).then(|| a.value(row)),
            Self::Utf8View(a) => (!a.is_null(row)).then(|| a.value(row)),
        }
    }
}

fn downcast<T: 'static>(array: &dyn Array) -> Result<&T, VariantError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        VariantError::InternalError(format!(
            "Array of type {:?} failed to downcast",
            array.data_type()
        ))
    })
}

//==================================================================================
// 3. Output Column Builder
//==================================================================================

pub enum ResultColumnBuilder {
    Boolean(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
    Variant(BinaryBuilder),
}

impl ResultColumnBuilder {
    pub fn new(result_type: QueryResultType, capacity: usize) -> Self {
        match result_type {
            QueryResultType::Boolean => Self::Boolean(BooleanBuilder::with_capacity(capacity)),
            QueryResultType::Int8 => Self::Int8(Int8Builder::with_capacity(capacity)),
            QueryResultType::Int16 => Self::Int16(Int16Builder::with_capacity(capacity)),
            QueryResultType::Int32 => Self::Int32(Int32Builder::with_capacity(capacity)),
            QueryResultType::Int64 => Self::Int64(Int64Builder::with_capacity(capacity)),
            QueryResultType::Float32 => Self::Float32(Float32Builder::with_capacity(capacity)),
            QueryResultType::Float64 => Self::Float64(Float64Builder::with_capacity(capacity)),
            QueryResultType::Utf8 => Self::Utf8(StringBuilder::with_capacity(capacity, capacity * 8)),
            QueryResultType::Variant => {
                Self::Variant(BinaryBuilder::with_capacity(capacity, capacity * 16))
            }
        }
    }

    pub fn append_null(&mut self) {
        match self {
            Self::Boolean(b) => b.append_null(),
            Self::Int8(b) => b.append_null(),
            Self::Int16(b) => b.append_null(),
            Self::Int32(b) => b.append_null(),
            Self::Int64(b) => b.append_null(),
            Self::Float32(b) => b.append_null(),
            Self::Float64(b) => b.append_null(),
            Self::Utf8(b) => b.append_null(),
            Self::Variant(b) => b.append_null(),
        }
    }

    /// Appends one cell. The value kind must match the builder's result type.
    pub fn append(&mut self, value: CastValue<'_>) -> Result<(), VariantError> {
        match (self, value) {
            (builder, CastValue::Null) => builder.append_null(),
            (Self::Boolean(b), CastValue::Boolean(v)) => b.append_value(v),
            (Self::Int8(b), CastValue::Int8(v)) => b.append_value(v),
            (Self::Int16(b), CastValue::Int16(v)) => b.append_value(v),
            (Self::Int32(b), CastValue::Int32(v)) => b.append_value(v),
            (Self::Int64(b), CastValue::Int64(v)) => b.append_value(v),
            (Self::Float32(b), CastValue::Float32(v)) => b.append_value(v),
            (Self::Float64(b), CastValue::Float64(v)) => b.append_value(v),
            (Self::Utf8(b), CastValue::Utf8(v)) => b.append_value(v.as_ref()),
            (Self::Variant(b), CastValue::Variant(v)) => {
                let mut buffer = Vec::with_capacity(v.serialized_size());
                v.serialize_into(&mut buffer);
                b.append_value(&buffer);
            }
            (_, other) => {
                return Err(VariantError::InternalError(format!(
                    "Cast produced {:?} for a column of another type",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Seals the builder into an immutable column.
    pub fn finish(self) -> ArrayRef {
        match self {
            Self::Boolean(mut b) => Arc::new(b.finish()),
            Self::Int8(mut b) => Arc::new(b.finish()),
            Self::Int16(mut b) => Arc::new(b.finish()),
            Self::Int32(mut b) => Arc::new(b.finish()),
            Self::Int64(mut b) => Arc::new(b.finish()),
            Self::Float32(mut b) => Arc::new(b.finish()),
            Self::Float64(mut b) => Arc::new(b.finish()),
            Self::Utf8(mut b) => Arc::new(b.finish()),
            Self::Variant(mut b) => Arc::new(b.finish()),
        }
    }
}
