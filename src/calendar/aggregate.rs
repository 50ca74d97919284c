use polars::prelude::{col, Column, DataFrame, DataType, Expr, IntoLazy};
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result, Stage};
use crate::table::{column, require_columns, string_values};
use super::{parse_date, CalendarUnit, OverflowPolicy};

/// Per-group reduction applied to each numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggStat {
    Min,
    Max,
    Mean,
    Sum,
}

impl AggStat {
    pub fn suffix(&self) -> &'static str {
        match self {
            AggStat::Min => "min",
            AggStat::Max => "max",
            AggStat::Mean => "mean",
            AggStat::Sum => "sum",
        }
    }

    /// Aggregated column name, e.g. `temp_min`.
    pub fn output_name(&self, attribute: &str) -> String {
        format!("{attribute}_{}", self.suffix())
    }

    fn expr(&self, attribute: &str) -> Expr {
        let base = col(attribute);
        let reduced = match self {
            AggStat::Min => base.min(),
            AggStat::Max => base.max(),
            AggStat::Mean => base.mean(),
            AggStat::Sum => base.sum(),
        };
        reduced.alias(self.output_name(attribute))
    }
}

/// How raw dated observations are grouped into calendar buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub unit: CalendarUnit,
    pub overflow: OverflowPolicy,
    /// Column holding `YYYY-MM-DD` dates or timestamps.
    pub date_column: String,
    pub district_column: String,
    /// Numeric attributes to reduce.
    pub attributes: Vec<String>,
    pub stats: Vec<AggStat>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            unit: CalendarUnit::Month,
            overflow: OverflowPolicy::default(),
            date_column: "date".to_string(),
            district_column: "district".to_string(),
            attributes: Vec::new(),
            stats: vec![AggStat::Min, AggStat::Max, AggStat::Mean],
        }
    }
}

impl AggregationConfig {
    /// Names of the aggregated attribute columns, attribute-major.
    pub fn output_attributes(&self) -> Vec<String> {
        self.attributes.iter()
            .flat_map(|attr| self.stats.iter().map(move |stat| stat.output_name(attr)))
            .collect()
    }
}

/// Group raw observations by (year, district, calendar bucket) and reduce every attribute.
///
/// The result is a long table with `year`, `district`, the unit's key column
/// (`day` as `"MM-DD"` strings, `week`/`month` as integers) and one `{attr}_{stat}`
/// column per attribute and statistic. Rows whose bucket is dropped by the
/// overflow policy are discarded.
pub fn aggregate_by_calendar(observations: &DataFrame, config: &AggregationConfig) -> Result<DataFrame> {
    let mut required = vec![config.date_column.as_str(), config.district_column.as_str()];
    required.extend(config.attributes.iter().map(String::as_str));
    require_columns(observations, &required, Stage::Aggregate)?;

    if config.attributes.is_empty() || config.stats.is_empty() {
        return Err(FeatureError::invalid(Stage::Aggregate, "at least one attribute and one statistic are required"));
    }

    let mut years = Vec::with_capacity(observations.height());
    let mut keys = Vec::with_capacity(observations.height());
    for (row, text) in string_values(observations, &config.date_column, Stage::Aggregate)?.into_iter().enumerate() {
        let date = text.as_deref().and_then(parse_date).ok_or_else(|| FeatureError::invalid(
            Stage::Aggregate,
            format!("column `{}` row {row}: unparseable date {:?}", config.date_column, text),
        ))?;
        years.push(i64::from(config.unit.year_for(date)));
        keys.push(config.unit.key_for(date, config.overflow));
    }

    let dropped = keys.iter().filter(|key| key.is_none()).count();
    if dropped > 0 {
        log::debug!("[aggregate] {dropped} observations fall outside the {:?} vocabulary and were dropped", config.unit);
    }

    let key_name = config.unit.column_name();
    let key_column = match config.unit {
        CalendarUnit::Day => Column::new(key_name.into(),
            keys.iter().map(|key| key.map(|k| k.to_string())).collect::<Vec<_>>()),
        CalendarUnit::Week | CalendarUnit::Month => Column::new(key_name.into(),
            keys.iter().map(|key| key.and_then(|k| k.ordinal())).collect::<Vec<_>>()),
    };

    let mut district = column(observations, &config.district_column, Stage::Aggregate)?.cast(&DataType::Int64)?;
    district.rename("district".into());

    let mut columns = vec![Column::new("year".into(), years), district, key_column];
    for attr in &config.attributes {
        columns.push(column(observations, attr, Stage::Aggregate)?.cast(&DataType::Float64)?);
    }
    let frame = DataFrame::new(columns)?;

    let aggs = config.attributes.iter()
        .flat_map(|attr| config.stats.iter().map(move |stat| stat.expr(attr)))
        .collect::<Vec<_>>();

    let grouped = frame.lazy()
        .filter(col(key_name).is_not_null())
        .group_by_stable([col("year"), col("district"), col(key_name)])
        .agg(aggs)
        .collect()?;

    log::debug!("[aggregate] {} observations -> {} {:?} groups", observations.height(), grouped.height(), config.unit);
    Ok(grouped)
}

/// Distinct bucket years present in a date column, ascending.
pub fn observed_years(observations: &DataFrame, date_column: &str, unit: CalendarUnit) -> Result<Vec<i64>> {
    let mut years = string_values(observations, date_column, Stage::Aggregate)?.into_iter()
        .flatten()
        .filter_map(|text| parse_date(&text))
        .map(|date| i64::from(unit.year_for(date)))
        .collect::<Vec<_>>();
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    fn config(unit: CalendarUnit) -> AggregationConfig {
        AggregationConfig {
            unit,
            attributes: vec!["temp".to_string()],
            ..AggregationConfig::default()
        }
    }

    fn value(df: &DataFrame, name: &str, row: usize) -> f64 {
        df.column(name).unwrap().f64().unwrap().get(row).unwrap()
    }

    #[test]
    fn monthly_min_max_mean() {
        let obs = df!(
            "date" => ["2011-05-01", "2011-05-20", "2011-06-02", "2012-05-03"],
            "district" => [4i64, 4, 4, 4],
            "temp" => [10.0, 20.0, 5.0, 7.0],
        ).unwrap();

        let out = aggregate_by_calendar(&obs, &config(CalendarUnit::Month)).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.get_column_names().iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            vec!["year", "district", "month", "temp_min", "temp_max", "temp_mean"]);

        // Stable grouping keeps first-appearance order.
        assert_eq!(out.column("year").unwrap().i64().unwrap().get(0), Some(2011));
        assert_eq!(out.column("month").unwrap().i64().unwrap().get(0), Some(5));
        assert_eq!(value(&out, "temp_min", 0), 10.0);
        assert_eq!(value(&out, "temp_max", 0), 20.0);
        assert_eq!(value(&out, "temp_mean", 0), 15.0);
        assert_eq!(value(&out, "temp_mean", 2), 7.0);
    }

    #[test]
    fn hourly_rows_collapse_into_day_keys() {
        let obs = df!(
            "date" => ["2015-07-04 01:00:00", "2015-07-04 13:00:00"],
            "district" => [1i64, 1],
            "temp" => [12.0, 30.0],
        ).unwrap();

        let out = aggregate_by_calendar(&obs, &config(CalendarUnit::Day)).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.column("day").unwrap().str().unwrap().get(0), Some("07-04"));
        assert_eq!(value(&out, "temp_max", 0), 30.0);
    }

    #[test]
    fn leap_day_dropped_by_default() {
        let obs = df!(
            "date" => ["2016-02-29", "2016-02-28"],
            "district" => [1i64, 1],
            "temp" => [1.0, 2.0],
        ).unwrap();

        let out = aggregate_by_calendar(&obs, &config(CalendarUnit::Day)).unwrap();
        assert_eq!(out.height(), 1);

        let folded = AggregationConfig { overflow: OverflowPolicy::Fold, ..config(CalendarUnit::Day) };
        let out = aggregate_by_calendar(&obs, &folded).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(value(&out, "temp_mean", 0), 1.5);
    }

    #[test]
    fn year_end_weeks_stay_apart() {
        let obs = df!(
            "date" => ["2021-01-02", "2021-12-30", "2019-01-02", "2019-12-31"],
            "district" => [1i64, 1, 1, 1],
            "temp" => [-20.0, 5.0, -10.0, 7.0],
        ).unwrap();
        let folded = AggregationConfig { overflow: OverflowPolicy::Fold, ..config(CalendarUnit::Week) };

        let out = aggregate_by_calendar(&obs, &folded).unwrap();
        assert_eq!(out.height(), 4);
        let years = out.column("year").unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>();
        let weeks = out.column("week").unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(years, vec![2020, 2021, 2019, 2020]);
        assert_eq!(weeks, vec![52, 52, 1, 1]);
        for row in 0..4 {
            assert_eq!(value(&out, "temp_min", row), value(&out, "temp_max", row));
        }
    }

    #[test]
    fn missing_attribute_names_stage() {
        let obs = df!("date" => ["2016-02-28"], "district" => [1i64]).unwrap();
        let err = aggregate_by_calendar(&obs, &config(CalendarUnit::Month)).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { stage: Stage::Aggregate, ref column } if column == "temp"));
    }

    #[test]
    fn bad_dates_fail_fast() {
        let obs = df!("date" => ["not a date"], "district" => [1i64], "temp" => [1.0]).unwrap();
        assert!(matches!(
            aggregate_by_calendar(&obs, &config(CalendarUnit::Week)),
            Err(FeatureError::InvalidInput { stage: Stage::Aggregate, .. })
        ));
    }

    #[test]
    fn observed_years_are_distinct_and_sorted() {
        let obs = df!("date" => ["2012-01-01", "2010-03-04", "2012-07-07"]).unwrap();
        assert_eq!(observed_years(&obs, "date", CalendarUnit::Month).unwrap(), vec![2010, 2012]);

        let turn = df!("date" => ["2019-12-31"]).unwrap();
        assert_eq!(observed_years(&turn, "date", CalendarUnit::Week).unwrap(), vec![2020]);
    }
}
