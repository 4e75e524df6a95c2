//! Wall-clock boundary arithmetic for continuous mode.
//!
//! Boundaries are aligned to UTC midnight: with a 5 minute interval cycles
//! run at `:00`, `:05`, `:10`, ... regardless of when the process started.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::error::DaemonError;

/// Longest accepted interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// The first boundary strictly after `now`: elapsed time since UTC midnight,
/// truncated to a multiple of `interval`, plus one `interval`.
pub fn next_boundary(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let midnight = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
    let since_midnight = (now - midnight).num_nanoseconds().unwrap_or(0);
    let step = i64::try_from(interval.as_nanos()).unwrap_or(i64::MAX).max(1);
    let truncated = since_midnight - since_midnight % step;
    midnight + chrono::Duration::nanoseconds(truncated.saturating_add(step))
}

/// Parse `30s`, `5m`, `1h`, `1h30m` or `500ms`. Must be positive and at most
/// [`MAX_INTERVAL`].
pub fn parse_interval(input: &str) -> Result<Duration, DaemonError> {
    let invalid = |reason: &str| DaemonError::InvalidInterval {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let text = input.trim();
    if text.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid("missing unit (use ms, s, m or h)"))?;
        if digits == 0 {
            return Err(invalid("expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| invalid("number out of range"))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            _ => return Err(invalid("unknown unit (use ms, s, m or h)")),
        };
        total = total.saturating_add(unit);
        rest = &rest[unit_len..];
    }

    if total.is_zero() {
        return Err(invalid("must be positive"));
    }
    if total > MAX_INTERVAL {
        return Err(invalid("must be at most 24h"));
    }
    Ok(total)
}

/// Compact human form, e.g. `6m59s`, `1h0m0s`, `250ms`.
pub fn format_wait(wait: Duration) -> String {
    let secs = wait.as_secs();
    if secs == 0 {
        return format!("{}ms", wait.as_millis());
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}
