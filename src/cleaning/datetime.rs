//! Timestamp and date parsing for the sighting source formats.

use chrono::{Days, NaiveDate, NaiveDateTime};

/// Source format of the `datetime` column.
pub const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M";
/// Source format of the `date posted` column.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Hour token meaning "midnight at the end of the day".
const END_OF_DAY: &str = "24:00";
const MIDNIGHT: &str = "00:00";

/// Parse a `MM/DD/YYYY HH:MM` value, resolving the `24:00` hour token.
///
/// Every `24:00` is rewritten to `00:00` before parsing; when the token was present the parsed
/// timestamp is moved forward by one calendar day.
///
/// ```
/// use chrono::NaiveDate;
/// use sightings_etl::cleaning::datetime::repair_datetime;
///
/// let ts = repair_datetime("12/31/1999 24:00").unwrap();
/// assert_eq!(ts, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
/// ```
pub fn repair_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    let end_of_day = trimmed.contains(END_OF_DAY);
    let rewritten = trimmed.replace(END_OF_DAY, MIDNIGHT);

    let parsed = NaiveDateTime::parse_from_str(&rewritten, DATETIME_FORMAT)
        .map_err(|e| format!("expected {DATETIME_FORMAT}: {e}"))?;

    if end_of_day {
        parsed
            .checked_add_days(Days::new(1))
            .ok_or_else(|| "timestamp out of range after 24:00 rollover".to_string())
    } else {
        Ok(parsed)
    }
}

/// Parse a `MM/DD/YYYY` value.
pub fn parse_date_posted(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| format!("expected {DATE_FORMAT}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn end_of_day_rolls_to_next_day() {
        assert_eq!(repair_datetime("01/15/2020 24:00").unwrap(), ts(2020, 1, 16, 0, 0));
    }

    #[test]
    fn regular_time_is_not_shifted() {
        assert_eq!(repair_datetime("01/15/2020 23:59").unwrap(), ts(2020, 1, 15, 23, 59));
        assert_eq!(repair_datetime("01/15/2020 00:00").unwrap(), ts(2020, 1, 15, 0, 0));
    }

    #[test]
    fn end_of_day_crosses_month_and_leap_day() {
        assert_eq!(repair_datetime("02/28/2020 24:00").unwrap(), ts(2020, 2, 29, 0, 0));
        assert_eq!(repair_datetime("02/29/2020 24:00").unwrap(), ts(2020, 3, 1, 0, 0));
        assert_eq!(repair_datetime("12/31/1999 24:00").unwrap(), ts(2000, 1, 1, 0, 0));
    }

    #[test]
    fn accepts_single_digit_components() {
        assert_eq!(repair_datetime("1/5/2004 7:30").unwrap(), ts(2004, 1, 5, 7, 30));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(repair_datetime("2020-01-15 10:00").is_err());
        assert!(repair_datetime("01/15/2020 25:00").is_err());
        assert!(repair_datetime("").is_err());
    }

    #[test]
    fn date_posted_parses_and_rejects_invalid_month() {
        assert_eq!(
            parse_date_posted("04/27/2004").unwrap(),
            NaiveDate::from_ymd_opt(2004, 4, 27).unwrap()
        );
        assert!(parse_date_posted("13/40/2020").is_err());
    }
}
