//! Duration parsing for profile values.
//!
//! Lease and interval settings in profiles are written as `"30m"`, `"2h"`,
//! `"1500ms"` or a bare number of seconds.

use crate::error::ConversionError;
use std::time::Duration;

/// Parse a duration string into a [`Duration`].
///
/// Supported units (longest suffix wins):
/// - Milliseconds: "ms"
/// - Seconds: "s", "sec", "secs", "second", "seconds", or no unit
/// - Minutes: "m", "min", "mins", "minute", "minutes"
/// - Hours: "h", "hr", "hrs", "hour", "hours"
/// - Days: "d", "day", "days"
///
/// # Examples
/// ```
/// use peercfg::utils::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1800").unwrap(), Duration::from_secs(1800));
/// assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(value: &str) -> Result<Duration, ConversionError> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let amount: u64 = number
        .parse()
        .map_err(|_| ConversionError::new(value, "duration"))?;

    let seconds_per = |factor: u64| {
        amount
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| ConversionError::new(value, "duration"))
    };

    let duration = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => Duration::from_millis(amount),
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => seconds_per(60)?,
        "h" | "hr" | "hrs" | "hour" | "hours" => seconds_per(3600)?,
        "d" | "day" | "days" => seconds_per(86_400)?,
        _ => return Err(ConversionError::new(value, "duration")),
    };
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("45 secs").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("20min").unwrap(), Duration::from_secs(1200));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("2HOURS").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1500ms").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_duration_rejects_invalid() {
        for bad in [
            "",
            "m",
            "5x",
            "5minutesx",
            "-3s",
            "1.5h",
            "999999999999999999d",
            "18446744073709551615m",
        ] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.target, "duration", "input {:?}", bad);
        }
    }
}
