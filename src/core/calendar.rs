//! Calendar-month arithmetic and lenient date parsing.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date from the formats commonly found in exported sales tables.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and RFC 3339 timestamps. The time of day is discarded.
///
/// # Example
/// ```
/// use commodity_forecast::core::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2015, 12, 27);
/// assert_eq!(parse_date("2015-12-27"), expected);
/// assert_eq!(parse_date("12/27/2015"), expected);
/// assert_eq!(parse_date("27.12.2015"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.day0()))
}

/// Shift a month start forward by `months` calendar months.
pub fn add_months(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(months))
}

/// Number of whole calendar months from `from` to `to` (negative if `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let from = i64::from(from.year()) * 12 + i64::from(from.month0());
    let to = i64::from(to.year()) * 12 + i64::from(to.month0());
    to - from
}

/// Consecutive month starts beginning with the month *after* `last`.
pub fn following_months(last: NaiveDate, count: usize) -> Option<Vec<NaiveDate>> {
    let start = month_start(last);
    (1..=count)
        .map(|i| u32::try_from(i).ok().and_then(|i| add_months(start, i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_date("2015-01-04"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("2015/01/04"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("01/04/2015"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("2015-01-04 13:45:00"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("2015-01-04T13:45:00"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("2015-01-04T23:00:00+02:00"), Some(ymd(2015, 1, 4)));
        assert_eq!(parse_date("  2015-01-04 "), Some(ymd(2015, 1, 4)));
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2015-02-30"), None);
        assert_eq!(parse_date("2015-13-01"), None);
    }

    #[test]
    fn month_start_truncates_day() {
        assert_eq!(month_start(ymd(2016, 2, 29)), ymd(2016, 2, 1));
        assert_eq!(month_start(ymd(2016, 2, 1)), ymd(2016, 2, 1));
    }

    #[test]
    fn month_arithmetic_crosses_years() {
        assert_eq!(add_months(ymd(2017, 11, 1), 3), Some(ymd(2018, 2, 1)));
        assert_eq!(months_between(ymd(2017, 11, 1), ymd(2018, 2, 1)), 3);
        assert_eq!(months_between(ymd(2018, 2, 1), ymd(2017, 11, 1)), -3);
        assert_eq!(months_between(ymd(2018, 2, 1), ymd(2018, 2, 28)), 0);
    }

    #[test]
    fn following_months_starts_after_last() {
        let months = following_months(ymd(2018, 3, 1), 3).unwrap();
        assert_eq!(months, vec![ymd(2018, 4, 1), ymd(2018, 5, 1), ymd(2018, 6, 1)]);
        assert!(following_months(ymd(2018, 3, 1), 0).unwrap().is_empty());
    }
}
