use crate::error::{Result, ScopeError};
use crate::model::DateWindow;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Monday of the (UTC) week containing `timestamp`.
pub fn week_start(timestamp: &DateTime<Utc>) -> NaiveDate {
    let day = timestamp.date_naive();
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// First path segment, or `root` for files at the repository root.
pub fn top_level_dir(path: &str) -> &str {
    match path.split_once('/') {
        Some((first, _)) if !first.is_empty() => first,
        _ => "root",
    }
}

pub fn short_sha(sha: &str) -> String {
    sha.chars().take(8).collect()
}

pub fn resolve_window(since: Option<&str>, until: Option<&str>) -> Result<DateWindow> {
    resolve_window_at(since, until, Utc::now())
}

pub fn resolve_window_at(
    since: Option<&str>,
    until: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateWindow> {
    let mut window = DateWindow::new();

    let from = since.map(|s| parse_date_bound(s, now)).transpose()?;
    let to = until.map(|u| parse_date_bound(u, now)).transpose()?;

    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(ScopeError::InvalidDate(format!(
                "Invalid range: since ({f}) is after until ({t})"
            )));
        }
    }

    if let Some(f) = from {
        window = window.with_from(f);
    }
    if let Some(t) = to {
        window = window.with_to(t);
    }
    Ok(window)
}

fn parse_date_bound(input: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    // YYYY-MM-DD
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }

    // RFC3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(input.trim()) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    // "3 days ago", "2 weeks ago", "6 months ago"
    if let Some(days) = parse_relative_days(input) {
        return now
            .checked_sub_signed(Duration::days(days))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ScopeError::InvalidDate(format!("Duration overflow for '{input}'")));
    }

    Err(ScopeError::InvalidDate(input.to_string()))
}

fn parse_relative_days(input: &str) -> Option<i64> {
    let input = input.trim().to_lowercase();
    let rest = input.strip_suffix(" ago")?;
    let (count, unit) = rest.trim().split_once(' ')?;
    let n: i64 = count.trim().parse().ok()?;
    let per_unit = match unit.trim() {
        "day" | "days" => 1,
        "week" | "weeks" => 7,
        "month" | "months" => 30,
        _ => return None,
    };
    n.checked_mul(per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_start_is_monday() {
        // 2024-03-07 is a Thursday
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 23, 0, 0).unwrap();
        assert_eq!(week_start(&ts), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(week_start(&monday), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(week_start(&sunday), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn top_level_dir_falls_back_to_root() {
        assert_eq!(top_level_dir("src/lib.rs"), "src");
        assert_eq!(top_level_dir("a/b/c.txt"), "a");
        assert_eq!(top_level_dir("README.md"), "root");
    }

    #[test]
    fn resolves_dates_and_relative_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let window = resolve_window_at(Some("2 weeks ago"), Some("2024-06-14"), now).unwrap();
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(window.to, NaiveDate::from_ymd_opt(2024, 6, 14));

        let rfc = resolve_window_at(Some("2024-01-02T03:04:05Z"), None, now).unwrap();
        assert_eq!(rfc.from, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(rfc.to, None);
    }

    #[test]
    fn rejects_inverted_or_garbled_ranges() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        assert!(resolve_window_at(Some("2024-02-01"), Some("2024-01-01"), now).is_err());
        assert!(resolve_window_at(Some("yesterday-ish"), None, now).is_err());
    }
}
