//! Date expression normalization service
//!
//! Resolves free-form date expressions ("2024-10", "last month", "Dec 2024")
//! to the first instant of the period they name. Used for report range bounds.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::types::{ReporterError, Result};

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid regex"));
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").expect("valid regex"));
static YEAR_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[t ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?$")
        .expect("valid regex")
});
static MONTH_NAME_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)\.?,?\s+(\d{4})$").expect("valid regex"));
static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(last|this|next)\s+(day|week|month|year)$").expect("valid regex")
});
static AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(day|week|month|year)s?\s+ago$").expect("valid regex")
});
static IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^in\s+(\d+)\s+(day|week|month|year)s?$").expect("valid regex"));

/// Granularity an expression was written at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    fn precision(self) -> Precision {
        match self {
            Self::Day | Self::Week => Precision::Day,
            Self::Month => Precision::Month,
            Self::Year => Precision::Year,
        }
    }
}

/// Normalize a date expression relative to the local calendar date.
///
/// # Examples
/// ```
/// use zaptec_reporter::services::date_normalizer::normalize;
///
/// let start = normalize("2024-10").unwrap();
/// assert_eq!(start.to_string(), "2024-10-01 00:00:00");
/// ```
pub fn normalize(expression: &str) -> Result<NaiveDateTime> {
    normalize_at(expression, Local::now().date_naive())
}

/// Normalize a date expression, resolving relative forms against `today`.
pub fn normalize_at(expression: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    let invalid = || ReporterError::InvalidDate(expression.to_string());

    let (date, precision) = parse_expression(expression, today).ok_or_else(invalid)?;
    let start = match precision {
        Precision::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        Precision::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        Precision::Day => Some(date),
    }
    .ok_or_else(invalid)?;

    Ok(start.and_time(NaiveTime::MIN))
}

/// Parse an expression into a calendar date and the precision it carries
pub fn parse_expression(expression: &str, today: NaiveDate) -> Option<(NaiveDate, Precision)> {
    let expr = expression.trim().to_lowercase();
    let expr = expr.split_whitespace().collect::<Vec<_>>().join(" ");

    match expr.as_str() {
        "" => return None,
        "today" | "now" => return Some((today, Precision::Day)),
        "yesterday" => return Some((today - Duration::days(1), Precision::Day)),
        "tomorrow" => return Some((today + Duration::days(1), Precision::Day)),
        _ => {}
    }

    if let Some(caps) = YEAR.captures(&expr) {
        let year = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| (d, Precision::Year));
    }

    if let Some(caps) = YEAR_MONTH.captures(&expr) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1).map(|d| (d, Precision::Month));
    }

    if let Some(caps) = YEAR_MONTH_DAY.captures(&expr) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, Precision::Day));
    }

    if let Some(caps) = MONTH_NAME_YEAR.captures(&expr) {
        let month = month_from_name(&caps[1])?;
        let year = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1).map(|d| (d, Precision::Month));
    }

    if let Some(month) = month_from_name(&expr) {
        return NaiveDate::from_ymd_opt(today.year(), month, 1).map(|d| (d, Precision::Month));
    }

    if let Some(caps) = RELATIVE.captures(&expr) {
        let offset = match &caps[1] {
            "last" => -1,
            "next" => 1,
            _ => 0,
        };
        let unit = Unit::parse(&caps[2])?;
        return shift(today, unit, offset).map(|d| (d, unit.precision()));
    }

    if let Some(caps) = AGO.captures(&expr) {
        let n: i64 = caps[1].parse().ok()?;
        let unit = Unit::parse(&caps[2])?;
        return shift(today, unit, -n).map(|d| (d, unit.precision()));
    }

    if let Some(caps) = IN.captures(&expr) {
        let n: i64 = caps[1].parse().ok()?;
        let unit = Unit::parse(&caps[2])?;
        return shift(today, unit, n).map(|d| (d, unit.precision()));
    }

    None
}

fn shift(date: NaiveDate, unit: Unit, amount: i64) -> Option<NaiveDate> {
    match unit {
        Unit::Day => date.checked_add_signed(Duration::try_days(amount)?),
        Unit::Week => date.checked_add_signed(Duration::try_weeks(amount)?),
        Unit::Month => shift_months(date, amount),
        Unit::Year => shift_months(date, amount.checked_mul(12)?),
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| {
            *m == name || (name.len() == 3 && m.starts_with(name)) || (name == "sept" && *m == "september")
        })
        .map(|i| i as u32 + 1)
}
