//! Helpers for validating raw trigger metadata.

use tracing::warn;

use pulsegrid_core::TriggerMetadata;

use crate::error::{ScalerError, ScalerResult};

/// A required key: absent or empty aborts construction.
pub(crate) fn required(metadata: &TriggerMetadata, key: &'static str) -> ScalerResult<String> {
    match metadata.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ScalerError::MissingMetadata(key)),
    }
}

/// A lenient non-negative integer: absent or empty yields the default;
/// malformed or negative values are logged and yield the default.
pub(crate) fn lenient_i64(metadata: &TriggerMetadata, key: &str, default: i64) -> i64 {
    let Some(raw) = metadata.get(key).filter(|v| !v.is_empty()) else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => value,
        _ => {
            warn!(key, value = %raw, default, "unparseable metadata value, using default");
            default
        }
    }
}
