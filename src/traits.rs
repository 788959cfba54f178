//! This module defines shared traits used across the cast pipeline.

use num_traits::NumCast;

use crate::cast::CastValue;
use crate::types::QueryResultType;

/// A primitive numeric output type that integer-family Variants can be
/// narrowed or widened into.
pub trait NumericTarget: NumCast + Copy {
    /// The result type this primitive is produced for.
    const RESULT_TYPE: QueryResultType;

    fn into_cast_value(self) -> CastValue<'static>;
}

// Implement the trait for every numeric result type.
macro_rules! impl_numeric_target {
    ($T:ty, $variant:ident) => {
        impl NumericTarget for $T {
            const RESULT_TYPE: QueryResultType = QueryResultType::$variant;

            fn into_cast_value(self) -> CastValue<'static> {
                CastValue::$variant(self)
            }
        }
    };
}

impl_numeric_target!(i8, Int8);
impl_numeric_target!(i16, Int16);
impl_numeric_target!(i32, Int32);
impl_numeric_target!(i64, Int64);
impl_numeric_target!(f32, Float32);
impl_numeric_target!(f64, Float64);
