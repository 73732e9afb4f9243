//! Time expressions accepted by the query tools
//!
//! Either RFC 3339 timestamps or Grafana-style relative expressions such as
//! `now`, `now-1h` or `now-30m`.

use chrono::{DateTime, Duration, Utc};
use grafana_mcp_core::ToolError;

/// Resolve a time expression against `now`
pub fn parse_time(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let expr = expr.trim();
    if expr == "now" {
        return Ok(now);
    }
    if let Some(offset) = expr.strip_prefix("now-") {
        return parse_offset(offset)?
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| format!("'{}' is out of range", expr));
    }
    if let Some(offset) = expr.strip_prefix("now+") {
        return parse_offset(offset)?
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| format!("'{}' is out of range", expr));
    }
    DateTime::parse_from_rfc3339(expr)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("'{}' is neither RFC 3339 nor a relative time like now-1h", expr))
}

/// `None` when the amount does not fit in a `Duration`
fn parse_offset(offset: &str) -> Result<Option<Duration>, String> {
    let split = offset
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in '{}'", offset))?;
    let (amount, unit) = offset.split_at(split);
    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid amount in '{}'", offset))?;

    match unit {
        "s" => Ok(Duration::try_seconds(amount)),
        "m" => Ok(Duration::try_minutes(amount)),
        "h" => Ok(Duration::try_hours(amount)),
        "d" => Ok(Duration::try_days(amount)),
        "w" => Ok(Duration::try_weeks(amount)),
        _ => Err(format!("unknown unit '{}'", unit)),
    }
}

/// Start and end of a query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Resolve optional start/end arguments, defaulting to the last hour
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ToolError> {
        let end = match end {
            Some(expr) => parse_time(expr, now).map_err(|e| ToolError::invalid_argument("endTime", e))?,
            None => now,
        };
        let start = match start {
            Some(expr) => {
                parse_time(expr, now).map_err(|e| ToolError::invalid_argument("startTime", e))?
            }
            None => Duration::try_hours(1)
                .and_then(|hour| end.checked_sub_signed(hour))
                .ok_or_else(|| ToolError::invalid_argument("endTime", "is out of range"))?,
        };
        if start > end {
            return Err(ToolError::invalid_argument(
                "startTime",
                "must not be after endTime",
            ));
        }
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_and_absolute() {
        assert_eq!(parse_time("now", now()).unwrap(), now());
        assert_eq!(
            parse_time("now-1h", now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time("now-30m", now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("2024-05-01T10:00:00+02:00", now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
        assert!(parse_time("yesterday", now()).is_err());
        assert!(parse_time("now-5y", now()).is_err());
    }

    #[test]
    fn test_default_window_is_last_hour() {
        let range = TimeRange::resolve(None, None, now()).unwrap();

        assert_eq!(range.end, now());
        assert_eq!(range.start, now() - Duration::hours(1));
    }

    #[test]
    fn test_huge_offsets_are_errors() {
        assert!(parse_time("now-99999999999999w", now())
            .unwrap_err()
            .contains("out of range"));
        assert!(parse_time("now+9223372036854775807s", now()).is_err());
        assert!(parse_time("now-99999999999999999999d", now()).is_err());

        let err = TimeRange::resolve(Some("now-99999999999999w"), None, now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument 'startTime': 'now-99999999999999w' is out of range"
        );
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = TimeRange::resolve(Some("now"), Some("now-1h"), now()).unwrap_err();
        assert!(err.to_string().contains("startTime"));
    }
}
