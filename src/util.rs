// Utility helpers for parsing cells and formatting console numbers.
//
// This module centralizes all the "dirty" spreadsheet handling so the rest
// of the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

// Day-first layouts come before ISO so `03.04.2022` is the 3rd of April.
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
// Two-digit years (`03.04.22`), tried only after the four-digit layouts.
const SHORT_YEAR_FORMATS: &[&str] = &["%d.%m.%y", "%d/%m/%y", "%d-%m-%y"];
const SHORT_YEAR_DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
];

// `%Y` happily reads "22" as year 22; such dates are never real submissions.
const MIN_YEAR: i32 = 1000;

/// Trim a raw cell and turn empty strings into `None`.
pub fn clean_cell(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse a submission date using the day-first convention.
///
/// Spreadsheet exports mix plain dates and timestamps; the time part is
/// dropped. Anything unrecognized yields `None` instead of an error.
pub fn parse_date_dayfirst(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let plausible = |d: NaiveDate| (d.year() >= MIN_YEAR).then_some(d);
    let dates = DATE_FORMATS.iter().chain(SHORT_YEAR_FORMATS);
    for fmt in dates {
        if let Some(d) = NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible) {
            return Some(d);
        }
    }
    let datetimes = DATETIME_FORMATS.iter().chain(SHORT_YEAR_DATETIME_FORMATS);
    for fmt in datetimes {
        if let Some(d) = NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .and_then(|dt| plausible(dt.date()))
        {
            return Some(d);
        }
    }
    None
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_dayfirst() {
        let expected = NaiveDate::from_ymd_opt(2022, 4, 3);
        assert_eq!(parse_date_dayfirst(Some("03.04.2022")), expected);
        assert_eq!(parse_date_dayfirst(Some("03/04/2022")), expected);
        assert_eq!(parse_date_dayfirst(Some(" 03.04.2022 14:05:00 ")), expected);
        assert_eq!(parse_date_dayfirst(Some("2022-04-03")), expected);
        assert_eq!(parse_date_dayfirst(Some("2022-04-03 08:00:00")), expected);
    }

    #[test]
    fn test_two_digit_year_is_not_year_22() {
        let expected = NaiveDate::from_ymd_opt(2022, 4, 3);
        assert_eq!(parse_date_dayfirst(Some("03.04.22")), expected);
        assert_eq!(parse_date_dayfirst(Some("03/04/22 10:15")), expected);
        assert_eq!(parse_date_dayfirst(Some("3.4.2022")), expected);
        assert_eq!(parse_date_dayfirst(Some("03.04.0022")), None);
    }

    #[test]
    fn test_fractional_seconds() {
        let expected = NaiveDate::from_ymd_opt(2022, 4, 3);
        assert_eq!(parse_date_dayfirst(Some("03.04.2022 14:05:00.123")), expected);
        assert_eq!(parse_date_dayfirst(Some("2022-04-03 08:00:00.000")), expected);
        assert_eq!(parse_date_dayfirst(Some("2022-04-03T08:00:00.5")), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date_dayfirst(None), None);
        assert_eq!(parse_date_dayfirst(Some("")), None);
        assert_eq!(parse_date_dayfirst(Some("не указано")), None);
        assert_eq!(parse_date_dayfirst(Some("31.02.2022")), None);
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell(Some("  Хирург ")), Some("Хирург".to_string()));
        assert_eq!(clean_cell(Some("   ")), None);
        assert_eq!(clean_cell(None), None);
    }

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(9855usize), "9,855");
    }
}
