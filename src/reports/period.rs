//! Calendar-month periods and record selection
//!
//! Records arrive with dates as text in whatever shape the record source
//! produced. Selection compares normalized `YYYY-MM` months, so timezones and
//! day-of-month never matter; a date that cannot be read excludes the record.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::db::{ExpenseRecord, IncomeRecord};
use crate::error::SaldoError;

/// A calendar year and month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Only months chrono can represent
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Month name in Portuguese
    pub fn month_name(&self) -> &'static str {
        match self.month {
            1 => "Janeiro",
            2 => "Fevereiro",
            3 => "Março",
            4 => "Abril",
            5 => "Maio",
            6 => "Junho",
            7 => "Julho",
            8 => "Agosto",
            9 => "Setembro",
            10 => "Outubro",
            11 => "Novembro",
            12 => "Dezembro",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// Accepts `YYYY-MM` or `MM/YYYY`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = if let Some((month, year)) = s.split_once('/') {
            NaiveDate::parse_from_str(&format!("{}-{}-01", year, month), "%Y-%m-%d").ok()
        } else {
            NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok()
        };

        parsed
            .map(YearMonth::from_date)
            .ok_or_else(|| {
                SaldoError::ParseError(format!("mês '{}'. Use AAAA-MM ou MM/AAAA", s)).into()
            })
    }
}

/// Anything carrying a record date as text
pub trait Dated {
    fn date_text(&self) -> &str;
}

impl Dated for IncomeRecord {
    fn date_text(&self) -> &str {
        &self.date
    }
}

impl Dated for ExpenseRecord {
    fn date_text(&self) -> &str {
        &self.date
    }
}

/// Read a record date.
///
/// Timestamps keep the calendar date as written, ignoring the offset.
/// Month-only values (`2025-05`) land on the first day.
pub fn parse_record_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok()
}

/// Normalize a record date to its calendar month
pub fn normalize_date(text: &str) -> Option<YearMonth> {
    parse_record_date(text).map(YearMonth::from_date)
}

/// Records whose date falls in `period`, in input order
pub fn select_period<T: Dated>(records: &[T], period: YearMonth) -> Vec<&T> {
    records
        .iter()
        .filter(|record| match normalize_date(record.date_text()) {
            Some(month) => month == period,
            None => {
                debug!("Skipping record with unreadable date '{}'", record.date_text());
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(&'static str);

    impl Dated for Entry {
        fn date_text(&self) -> &str {
            self.0
        }
    }

    fn may_2025() -> YearMonth {
        YearMonth::new(2025, 5).unwrap()
    }

    #[test]
    fn test_selects_whole_month_only() {
        let records = [Entry("2025-05-01"), Entry("2025-05-31"), Entry("2025-06-01")];
        let selected = select_period(&records, may_2025());
        let dates: Vec<&str> = selected.iter().map(|e| e.0).collect();
        assert_eq!(dates, vec!["2025-05-01", "2025-05-31"]);
    }

    #[test]
    fn test_invalid_dates_are_excluded() {
        let records = [
            Entry("2025-05-10"),
            Entry("not a date"),
            Entry("2025-02-30"),
            Entry(""),
        ];
        assert_eq!(select_period(&records, may_2025()).len(), 1);
    }

    #[test]
    fn test_timestamp_keeps_written_date() {
        assert_eq!(
            normalize_date("2025-05-31T23:30:00-03:00"),
            Some(may_2025())
        );
        assert_eq!(normalize_date("2025-05-31T19:07:13.094Z"), Some(may_2025()));
        assert_eq!(normalize_date("2025-05-31 08:00:00"), Some(may_2025()));
        assert_eq!(normalize_date("2025-05"), Some(may_2025()));
    }

    #[test]
    fn test_month_only_lands_on_first_day() {
        assert_eq!(
            parse_record_date("2025-05"),
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
    }

    #[test]
    fn test_year_month_parsing() {
        assert_eq!("2025-05".parse::<YearMonth>().unwrap(), may_2025());
        assert_eq!("05/2025".parse::<YearMonth>().unwrap(), may_2025());
        assert_eq!("5/2025".parse::<YearMonth>().unwrap(), may_2025());
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("may".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_display_and_names() {
        let ym = YearMonth::new(2025, 1).unwrap();
        assert_eq!(ym.to_string(), "2025-01");
        assert_eq!(ym.month_name(), "Janeiro");
        assert_eq!(YearMonth::new(2025, 12).unwrap().month_name(), "Dezembro");
        assert!(YearMonth::new(2025, 0).is_none());
    }
}
