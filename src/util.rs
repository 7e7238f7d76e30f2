use crate::error::{ChurnError, Result};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Parse a window start: RFC3339, `YYYY-MM-DD`, `N days|weeks|months ago`, or a
/// humantime duration such as `7d` or `2weeks` measured back from `now`.
pub fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    let duration = parse_natural_duration(input)
        .or_else(|| {
            humantime::parse_duration(input)
                .ok()
                .and_then(|d| Duration::from_std(d).ok())
        })
        .ok_or_else(|| ChurnError::InvalidDate(format!("Unrecognised date or duration '{input}'")))?;

    now.checked_sub_signed(duration)
        .ok_or_else(|| ChurnError::InvalidDate(format!("Duration overflow for '{input}'")))
}

fn parse_natural_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    let rest = input.strip_suffix(" ago")?;
    let (count, unit) = rest.trim().split_once(' ')?;
    let n: i64 = count.trim().parse().ok()?;
    match unit.trim() {
        "day" | "days" => Duration::try_days(n),
        "week" | "weeks" => Duration::try_weeks(n),
        "month" | "months" => n.checked_mul(30).and_then(Duration::try_days),
        _ => None,
    }
}

/// Cutoff timestamp handed to git, defaulting to a week before `now`.
pub fn effective_cutoff(since: Option<&str>, now: DateTime<Utc>) -> Result<String> {
    let at = match since {
        Some(s) if !s.trim().is_empty() => parse_since(s, now)?,
        _ => now - Duration::days(DEFAULT_WINDOW_DAYS),
    };
    Ok(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}
