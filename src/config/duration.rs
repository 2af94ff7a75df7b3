// src/config/duration.rs

use std::time::Duration;

/// Parse a delay such as `"3s"`, `"250ms"`, `"1m"` or `"2h"`.
///
/// Values that do not fit in a `u64` count of milliseconds are rejected
/// rather than wrapped.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let Some(split) = s.find(|c: char| !c.is_ascii_digit()) else {
        return Err(format!("duration '{s}' is missing a unit (ms, s, m or h)"));
    };
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("duration '{s}' must start with a number"));
    }

    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number '{digits}': {e}"))?;

    let millis_per_unit: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ms, s, m or h"
            ))
        }
    };

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
