//! Lenient decoding of the diagnostic `timestamp` field.
//!
//! Peers stamp frames with whatever number their clock gives them:
//! integer milliseconds, fractional milliseconds, exponent notation or
//! nothing at all. The value is never used for correlation, so any JSON
//! number decodes and anything unusable becomes `0`.

use serde::{Deserialize, Deserializer};
use serde_json::Number;

/// Decodes an optional JSON number as whole epoch milliseconds.
///
/// Fractions are truncated, negatives and non-finite values become `0`,
/// values past `u64::MAX` saturate.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number.map_or(0, |number| to_millis(&number)))
}

fn to_millis(number: &Number) -> u64 {
    if let Some(millis) = number.as_u64() {
        return millis;
    }

    match number.as_f64() {
        // `as` saturates at u64::MAX
        Some(millis) if millis.is_finite() && millis > 0.0 => millis as u64,
        _ => 0,
    }
}
