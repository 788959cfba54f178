//! The value caster: converts a resolved Variant into one output cell.
//!
//! The core conversion (`cast_variant`) knows nothing about failure policy.
//! `cast_with_mode` projects its errors according to the configured
//! `CastMode`, so both policies share one set of coercion rules.

use std::borrow::Cow;

use chrono::FixedOffset;
use log::trace;

use crate::config::CastMode;
use crate::error::VariantError;
use crate::traits::NumericTarget;
use crate::types::{QueryResultType, VariantType};
use crate::variant::{Variant, VariantValue};

/// One output cell, borrowed from the input where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum CastValue<'a> {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(Cow<'a, str>),
    Variant(VariantValue),
}

impl CastValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, CastValue::Null)
    }
}

/// Converts `variant` into `target`. A Variant null always becomes `Null`.
pub fn cast_variant<'a>(
    variant: &Variant<'a>,
    target: QueryResultType,
    timezone: &FixedOffset,
) -> Result<CastValue<'a>, VariantError> {
    if variant.is_null() {
        return Ok(CastValue::Null);
    }
    match target {
        QueryResultType::Boolean => cast_to_bool(variant).map(CastValue::Boolean),
        QueryResultType::Int8 => cast_numeric::<i8>(variant),
        QueryResultType::Int16 => cast_numeric::<i16>(variant),
        QueryResultType::Int32 => cast_numeric::<i32>(variant),
        QueryResultType::Int64 => cast_numeric::<i64>(variant),
        QueryResultType::Float32 => cast_numeric::<f32>(variant),
        QueryResultType::Float64 => cast_numeric::<f64>(variant),
        QueryResultType::Utf8 => cast_to_string(variant, timezone).map(CastValue::Utf8),
        QueryResultType::Variant => Ok(CastValue::Variant(VariantValue::from_variant(variant))),
    }
}

/// Runs `cast_variant` and applies the failure policy.
///
/// Under `Safe` every row-level failure becomes `Null`. Under `Strict` cast
/// failures are returned and any other row-level failure still becomes `Null`.
/// Errors that are not row-level are always returned.
pub fn cast_with_mode<'a>(
    variant: &Variant<'a>,
    target: QueryResultType,
    timezone: &FixedOffset,
    mode: CastMode,
) -> Result<CastValue<'a>, VariantError> {
    match cast_variant(variant, target, timezone) {
        Ok(value) => Ok(value),
        Err(e) if e.is_cast_failure() && mode == CastMode::Strict => Err(e),
        Err(e) if e.is_row_recoverable() => {
            trace!("Cast of {} to {} failed: {}", variant.variant_type(), target, e);
            Ok(CastValue::Null)
        }
        Err(e) => Err(e),
    }
}

//==================================================================================
// Per-target conversions
//==================================================================================

/// Booleans pass through. Strings are parsed as an integer first (non-zero is
/// true) and then as a case-insensitive `true`/`false` literal.
fn cast_to_bool(variant: &Variant<'_>) -> Result<bool, VariantError> {
    match variant.variant_type() {
        VariantType::Boolean => variant.get_bool(),
        VariantType::String => {
            let text = variant.get_string()?;
            let trimmed = text.trim();
            if let Ok(int) = trimmed.parse::<i32>() {
                return Ok(int != 0);
            }
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(VariantError::UnsupportedCast(format!(
                    "Failed to cast string '{}' to Boolean",
                    text
                )))
            }
        }
        actual => Err(unsupported(actual, QueryResultType::Boolean)),
    }
}

/// Accepts Boolean (as 0/1) and the integer family; out-of-range values fail.
fn cast_numeric<T: NumericTarget>(variant: &Variant<'_>) -> Result<CastValue<'static>, VariantError> {
    let source: i64 = match variant.variant_type() {
        VariantType::Boolean => i64::from(variant.get_bool()?),
        t if t.is_integer() => variant.get_integer()?,
        actual => return Err(unsupported(actual, T::RESULT_TYPE)),
    };
    let narrowed = <T as num_traits::NumCast>::from(source).ok_or_else(|| {
        VariantError::UnsupportedCast(format!(
            "Value {} is out of range for {}",
            source,
            T::RESULT_TYPE
        ))
    })?;
    Ok(narrowed.into_cast_value())
}

/// Strings pass through verbatim; every other type is rendered as JSON.
fn cast_to_string<'a>(
    variant: &Variant<'a>,
    timezone: &FixedOffset,
) -> Result<Cow<'a, str>, VariantError> {
    match variant.variant_type() {
        VariantType::String => variant.get_string().map(Cow::Borrowed),
        _ => variant.to_json(timezone).map(Cow::Owned),
    }
}

fn unsupported(actual: VariantType, target: QueryResultType) -> VariantError {
    VariantError::UnsupportedCast(format!(
        "Cannot cast variant of type {} to {}",
        actual, target
    ))
}
