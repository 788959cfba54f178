//! Renders a Variant view as compact JSON text.
//!
//! This is the canonical "stringify anything" path used by the string cast.
//! Recursion depth equals the nesting depth of the document itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::error::VariantError;
use crate::types::VariantType;
use crate::variant::value::{Variant, VariantDecimal};

const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;
/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

impl<'a> Variant<'a> {
    pub fn to_json(&self, timezone: &FixedOffset) -> Result<String, VariantError> {
        variant_to_json(self, timezone)
    }
}

/// Renders `variant` as JSON, converting timezone-aware timestamps to `timezone`.
pub fn variant_to_json(variant: &Variant<'_>, timezone: &FixedOffset) -> Result<String, VariantError> {
    let mut out = String::new();
    write_json(variant, timezone, &mut out)?;
    Ok(out)
}

/// Appends the JSON rendering of `variant` to `out`.
pub fn write_json(
    variant: &Variant<'_>,
    timezone: &FixedOffset,
    out: &mut String,
) -> Result<(), VariantError> {
    match variant.variant_type() {
        VariantType::Null => out.push_str("null"),
        VariantType::Boolean => out.push_str(if variant.get_bool()? { "true" } else { "false" }),
        VariantType::Int8 | VariantType::Int16 | VariantType::Int32 | VariantType::Int64 => {
            out.push_str(&variant.get_integer()?.to_string())
        }
        VariantType::Float => write_float(f64::from(variant.get_float()?), out)?,
        VariantType::Double => write_float(variant.get_double()?, out)?,
        VariantType::Decimal4 | VariantType::Decimal8 | VariantType::Decimal16 => {
            out.push_str(&format_decimal(variant.get_decimal()?))
        }
        VariantType::String => write_string(variant.get_string()?, out)?,
        VariantType::Binary => write_string(&BASE64.encode(variant.get_binary()?), out)?,
        VariantType::Date => write_string(&format_date(variant.get_date()?)?, out)?,
        VariantType::TimestampTz => {
            let ts = timestamp_from_parts(variant.get_timestamp_micros()?, MICROS_PER_SECOND)?;
            let text = ts
                .with_timezone(timezone)
                .format("%Y-%m-%d %H:%M:%S%.6f%:z")
                .to_string();
            write_string(&text, out)?
        }
        VariantType::TimestampNtz => {
            let ts = timestamp_from_parts(variant.get_timestamp_micros()?, MICROS_PER_SECOND)?;
            write_string(&ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string(), out)?
        }
        VariantType::TimestampNanosTz => {
            let ts = timestamp_from_parts(variant.get_timestamp_nanos()?, NANOS_PER_SECOND)?;
            let text = ts
                .with_timezone(timezone)
                .format("%Y-%m-%d %H:%M:%S%.9f%:z")
                .to_string();
            write_string(&text, out)?
        }
        VariantType::TimestampNanosNtz => {
            let ts = timestamp_from_parts(variant.get_timestamp_nanos()?, NANOS_PER_SECOND)?;
            write_string(&ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.9f").to_string(), out)?
        }
        VariantType::TimeNtz => write_string(&format_time(variant.get_time_micros()?)?, out)?,
        VariantType::Uuid => write_string(&format_uuid(&variant.get_uuid()?), out)?,
        VariantType::Object => {
            out.push('{');
            for (i, field) in variant.object_fields()?.enumerate() {
                let (name, child) = field?;
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out)?;
                out.push(':');
                write_json(&child, timezone, out)?;
            }
            out.push('}');
        }
        VariantType::Array => {
            out.push('[');
            for (i, element) in variant.array_elements()?.enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json(&element?, timezone, out)?;
            }
            out.push(']');
        }
    }
    Ok(())
}

//==================================================================================
// Private Helpers
//==================================================================================

fn write_string(s: &str, out: &mut String) -> Result<(), VariantError> {
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

/// Non-finite values have no JSON form and render as `null`.
fn write_float(value: f64, out: &mut String) -> Result<(), VariantError> {
    out.push_str(&serde_json::to_string(&value)?);
    Ok(())
}

fn format_decimal(decimal: VariantDecimal) -> String {
    let digits = decimal.unscaled.unsigned_abs().to_string();
    let sign = if decimal.unscaled < 0 { "-" } else { "" };
    let scale = decimal.scale as usize;
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, whole, fraction)
}

fn format_date(days: i32) -> Result<String, VariantError> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| VariantError::decode(format!("Date {} days is out of range", days)))
}

fn timestamp_from_parts(ticks: i64, ticks_per_second: i64) -> Result<DateTime<chrono::Utc>, VariantError> {
    let secs = ticks.div_euclid(ticks_per_second);
    let sub = ticks.rem_euclid(ticks_per_second);
    let nanos = (sub * (NANOS_PER_SECOND / ticks_per_second)) as u32;
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| VariantError::decode(format!("Timestamp {} is out of range", ticks)))
}

fn format_time(micros: i64) -> Result<String, VariantError> {
    if !(0..MICROS_PER_DAY).contains(&micros) {
        return Err(VariantError::decode(format!(
            "Time {} micros is outside a single day",
            micros
        )));
    }
    let secs = (micros / MICROS_PER_SECOND) as u32;
    let nanos = ((micros % MICROS_PER_SECOND) * 1_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .map(|t| t.format("%H:%M:%S%.6f").to_string())
        .ok_or_else(|| VariantError::decode(format!("Time {} micros is out of range", micros)))
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
