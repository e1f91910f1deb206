use chrono::{DateTime, NaiveDate, Utc};

pub const FLOAT_EPSILON: f64 = 1e-6;

pub fn approx_eq(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() <= FLOAT_EPSILON
}

/// Elapsed minutes between two instants, floored at zero.
///
/// Returns `None` when either end is missing so callers can exclude the row
/// instead of counting it as a zero-length interval.
pub fn elapsed_minutes(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<f64> {
    let (start, end) = (start?, end?);
    let millis = (end - start).num_milliseconds() as f64;
    Some((millis / 60_000.0).max(0.0))
}

/// Same as [`elapsed_minutes`], in hours.
pub fn elapsed_hours(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<f64> {
    elapsed_minutes(start, end).map(|m| m / 60.0)
}

/// UTC midnight at the start of `day`.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a filter date. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC
/// calendar day is used). Blank or malformed input yields `None`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn elapsed_is_none_when_an_end_is_missing() {
        let t = Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap();
        assert_eq!(elapsed_minutes(Some(t), None), None);
        assert_eq!(elapsed_minutes(None, Some(t)), None);
    }

    #[test]
    fn elapsed_floors_clock_skew_at_zero() {
        let start = Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap();
        let earlier = start - chrono::Duration::minutes(5);
        assert_eq!(elapsed_minutes(Some(start), Some(earlier)), Some(0.0));
        assert_eq!(elapsed_hours(Some(start), Some(start + chrono::Duration::minutes(90))), Some(1.5));
    }

    #[test]
    fn calendar_date_parsing_degrades_to_none() {
        assert_eq!(parse_calendar_date("2026-01-27"), NaiveDate::from_ymd_opt(2026, 1, 27));
        assert_eq!(parse_calendar_date(" 2026-01-27 "), NaiveDate::from_ymd_opt(2026, 1, 27));
        assert_eq!(
            parse_calendar_date("2026-01-27T23:30:00Z"),
            NaiveDate::from_ymd_opt(2026, 1, 27)
        );
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("27/01/2026"), None);
        assert_eq!(parse_calendar_date("2026-02-30"), None);
    }
}
