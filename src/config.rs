// In: src/config.rs

//! The single source of truth for variant query configuration.
//!
//! `VariantQueryConfig` is created once at the application boundary (e.g., from
//! a JSON document or engine session settings) and then passed down to every
//! fragment as a shared, read-only `Arc<VariantQueryConfig>`.

use arrow::compute::CastOptions;
use chrono::{FixedOffset, Local};
use serde::{Deserialize, Serialize};

use crate::error::VariantError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// How a failed coercion of a resolved value into the result type is reported.
///
/// Parse errors, malformed data and missing members always produce a null row;
/// this setting only governs cast failures.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CastMode {
    /// **Default:** an unsupported or failed cast yields a null row.
    #[default]
    Safe,

    /// A failed cast aborts the evaluation with the underlying error. Used when
    /// the caller has already committed to a non-nullable result.
    Strict,
}

impl CastMode {
    pub fn is_safe(&self) -> bool {
        matches!(self, CastMode::Safe)
    }
}

impl From<&CastOptions<'_>> for CastMode {
    fn from(options: &CastOptions<'_>) -> Self {
        if options.safe {
            CastMode::Safe
        } else {
            CastMode::Strict
        }
    }
}

impl From<CastMode> for CastOptions<'static> {
    fn from(mode: CastMode) -> Self {
        CastOptions {
            safe: mode.is_safe(),
            ..Default::default()
        }
    }
}

//==================================================================================
// II. The Unified VariantQueryConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct VariantQueryConfig {
    /// Failure policy for casts of resolved values.
    #[serde(default)]
    pub cast_mode: CastMode,

    /// Offset used when rendering timezone-aware timestamps as text, e.g.
    /// `"+08:00"` or `"UTC"`. `None` uses the local system offset.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Upper bound on distinct path strings memoised per fragment. Once full,
    /// new paths are parsed on every row without being stored.
    #[serde(default = "default_path_cache_capacity")]
    pub path_cache_capacity: usize,

    /// If true, a path that fails to parse is memoised as a failure so later
    /// rows with the same text skip the parser.
    #[serde(default = "default_true")]
    pub cache_parse_failures: bool,
}

impl Default for VariantQueryConfig {
    fn default() -> Self {
        Self {
            cast_mode: CastMode::default(),
            timezone: None,
            path_cache_capacity: default_path_cache_capacity(),
            cache_parse_failures: true,
        }
    }
}

impl VariantQueryConfig {
    /// Loads a configuration from a JSON document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, VariantError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolves the configured timezone into a fixed UTC offset.
    pub fn resolve_timezone(&self) -> Result<FixedOffset, VariantError> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(*Local::now().offset()),
            Some(tz) if tz.eq_ignore_ascii_case("utc") || tz == "Z" => utc(),
            Some(tz) => tz.parse::<FixedOffset>().map_err(|e| {
                VariantError::InvalidArgument(format!("Invalid timezone '{}': {}", tz, e))
            }),
        }
    }
}

fn utc() -> Result<FixedOffset, VariantError> {
    FixedOffset::east_opt(0)
        .ok_or_else(|| VariantError::InternalError("UTC offset out of range".to_string()))
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Helper for `serde` to provide a default for `path_cache_capacity`.
fn default_path_cache_capacity() -> usize {
    4096
}
