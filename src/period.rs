use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RecapError;

/// Weekday every report column lands on.
pub const ANCHOR_WEEKDAY: Weekday = Weekday::Sun;

/// First day of a calendar week when locating the first anchor.
pub const WEEK_START: Weekday = Weekday::Mon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum PeriodMode {
    #[serde(rename = "tahun", alias = "year")]
    #[value(name = "tahun", alias = "year")]
    Year,
    #[serde(rename = "bulan", alias = "month")]
    #[value(name = "bulan", alias = "month")]
    Month,
}

impl fmt::Display for PeriodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodMode::Year => f.write_str("tahun"),
            PeriodMode::Month => f.write_str("bulan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub anchors: Vec<NaiveDate>,
}

pub fn resolve_period(periode: &str, mode: PeriodMode) -> Result<ResolvedPeriod, RecapError> {
    let invalid = || RecapError::InvalidPeriod {
        periode: periode.to_string(),
        mode,
    };

    let (start, end) = match mode {
        PeriodMode::Year => {
            let year = parse_year(periode).ok_or_else(invalid)?;
            let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
            (start, end)
        }
        PeriodMode::Month => {
            let (year, month) = periode.split_once('-').ok_or_else(invalid)?;
            let year = parse_year(year).ok_or_else(invalid)?;
            let month = parse_month(month).ok_or_else(invalid)?;
            let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .ok_or_else(invalid)?;
            (start, end)
        }
    };

    Ok(ResolvedPeriod {
        start,
        end,
        anchors: anchor_dates(start, end),
    })
}

/// Every `ANCHOR_WEEKDAY` in `[start, end]`, ascending.
///
/// Stepping starts from the week containing `start`, so the first candidate
/// can precede `start`; such candidates are dropped rather than clamped.
pub fn anchor_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let week_start = start - Duration::days(days_between(WEEK_START, start.weekday()));
    let first = week_start + Duration::days(days_between(WEEK_START, ANCHOR_WEEKDAY));

    std::iter::successors(Some(first), |date| {
        date.checked_add_signed(Duration::days(7))
    })
    .take_while(|date| *date <= end)
    .filter(|date| *date >= start)
    .collect()
}

fn days_between(from: Weekday, to: Weekday) -> i64 {
    let from = i64::from(from.num_days_from_monday());
    let to = i64::from(to.num_days_from_monday());
    (to - from).rem_euclid(7)
}

fn parse_year(raw: &str) -> Option<i32> {
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

fn parse_month(raw: &str) -> Option<u32> {
    if raw.len() != 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|month| (1..=12).contains(month))
}
