use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Pivot granularity of a calendar aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarUnit {
    /// Day of year, keyed `"MM-DD"`.
    Day,
    /// ISO week number.
    Week,
    /// Month number.
    Month,
}

/// What to do with dates that fall outside the fixed vocabulary:
/// the leap day `02-29` and ISO week 53.
///
/// Week buckets belong to the ISO week-numbering year, so folding week 53
/// merges it with week 52 of the same ISO year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the observation.
    #[default]
    Drop,
    /// Merge into the preceding bucket (`02-28`, week 52).
    Fold,
    /// Add the extra bucket to the vocabulary.
    Extend,
}

/// A single calendar bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalendarKey {
    Day { month: u32, day: u32 },
    Week(u32),
    Month(u32),
}

impl fmt::Display for CalendarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarKey::Day { month, day } => write!(f, "{month:02}-{day:02}"),
            CalendarKey::Week(week) => write!(f, "{week}"),
            CalendarKey::Month(month) => write!(f, "{month}"),
        }
    }
}

impl CalendarKey {
    pub fn unit(&self) -> CalendarUnit {
        match self {
            CalendarKey::Day { .. } => CalendarUnit::Day,
            CalendarKey::Week(_) => CalendarUnit::Week,
            CalendarKey::Month(_) => CalendarUnit::Month,
        }
    }

    /// Integer form used for week/month key columns; day keys have none.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            CalendarKey::Day { .. } => None,
            CalendarKey::Week(n) | CalendarKey::Month(n) => Some(*n as i64),
        }
    }
}

impl CalendarUnit {
    pub const ALL: [CalendarUnit; 3] = [CalendarUnit::Day, CalendarUnit::Week, CalendarUnit::Month];

    /// Name of the key column carrying this unit in a long aggregate table.
    pub fn column_name(&self) -> &'static str {
        match self {
            CalendarUnit::Day => "day",
            CalendarUnit::Week => "week",
            CalendarUnit::Month => "month",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.column_name().eq_ignore_ascii_case(name.trim()))
    }

    /// Full bucket vocabulary, in calendar order.
    pub fn all_keys(&self, overflow: OverflowPolicy) -> Vec<CalendarKey> {
        let extend = overflow == OverflowPolicy::Extend;
        match self {
            CalendarUnit::Day => (1..=12u32)
                .flat_map(|month| {
                    let days = DAYS_IN_MONTH[month as usize - 1] + u32::from(extend && month == 2);
                    (1..=days).map(move |day| CalendarKey::Day { month, day })
                })
                .collect(),
            CalendarUnit::Week => (1..=52 + u32::from(extend)).map(CalendarKey::Week).collect(),
            CalendarUnit::Month => (1..=12).map(CalendarKey::Month).collect(),
        }
    }

    /// Year whose row a date's bucket belongs to.
    ///
    /// ISO weeks at the turn of the year can belong to the neighbouring year
    /// (2019-12-31 is week 1 of 2020), so weeks use the ISO week-numbering year.
    pub fn year_for(&self, date: NaiveDate) -> i32 {
        match self {
            CalendarUnit::Week => date.iso_week().year(),
            CalendarUnit::Day | CalendarUnit::Month => date.year(),
        }
    }

    /// Bucket a date falls into, or `None` when the overflow policy drops it.
    pub fn key_for(&self, date: NaiveDate, overflow: OverflowPolicy) -> Option<CalendarKey> {
        match self {
            CalendarUnit::Day => match (date.month(), date.day(), overflow) {
                (2, 29, OverflowPolicy::Drop) => None,
                (2, 29, OverflowPolicy::Fold) => Some(CalendarKey::Day { month: 2, day: 28 }),
                (month, day, _) => Some(CalendarKey::Day { month, day }),
            },
            CalendarUnit::Week => match (date.iso_week().week(), overflow) {
                (53, OverflowPolicy::Drop) => None,
                (53, OverflowPolicy::Fold) => Some(CalendarKey::Week(52)),
                (week, _) => Some(CalendarKey::Week(week)),
            },
            CalendarUnit::Month => Some(CalendarKey::Month(date.month())),
        }
    }

    /// Parse a rendered key of this unit. Week 53 and `02-29` are accepted here;
    /// whether they are looked up depends on the requested vocabulary.
    pub fn parse_key(&self, text: &str) -> Option<CalendarKey> {
        let text = text.trim();
        match self {
            CalendarUnit::Day => {
                let (month, day) = text.split_once('-')?;
                if month.len() != 2 || day.len() != 2 { return None }
                let (month, day) = (month.parse::<u32>().ok()?, day.parse::<u32>().ok()?);
                let max_day = match month {
                    2 => 29,
                    1..=12 => DAYS_IN_MONTH[month as usize - 1],
                    _ => return None,
                };
                (1..=max_day).contains(&day).then_some(CalendarKey::Day { month, day })
            }
            CalendarUnit::Week => text.parse::<u32>().ok()
                .filter(|week| (1..=53).contains(week))
                .map(CalendarKey::Week),
            CalendarUnit::Month => text.parse::<u32>().ok()
                .filter(|month| (1..=12).contains(month))
                .map(CalendarKey::Month),
        }
    }

    /// Infer the vocabulary from rendered key values.
    ///
    /// `MM-DD` strings are days; integers above 12 can only be weeks.
    /// A column of integers within 1–12 is ambiguous and yields `None`.
    pub fn detect_from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut max_ordinal = 0u32;
        let mut any = false;
        for value in values {
            any = true;
            if CalendarUnit::Day.parse_key(value).is_some() { return Some(CalendarUnit::Day) }
            max_ordinal = max_ordinal.max(CalendarUnit::Week.parse_key(value)
                .and_then(|key| key.ordinal())
                .map_or(0, |n| n as u32));
        }
        (any && max_ordinal > 12).then_some(CalendarUnit::Week)
    }
}

/// Parse the leading `YYYY-MM-DD` of a date or timestamp string.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim().get(..10)?, "%Y-%m-%d").ok()
}
