//! Calendar buckets, grouping raw observations into them, and spreading the
//! grouped table into one wide row per (year, district).

mod aggregate;
mod key;
mod reshape;

pub use aggregate::{aggregate_by_calendar, observed_years, AggStat, AggregationConfig};
pub use key::{parse_date, CalendarKey, CalendarUnit, OverflowPolicy};
pub use reshape::{reshape_by_calendar, ReshapeRequest};
