//! Declarative row filters selecting a season or era of samples.

use polars::prelude::{col, lit, DataFrame, Expr, IntoLazy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, Stage};
use crate::table::require_columns;

/// A single numeric comparison against one column. Null cells never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive on both ends.
    Between { column: String, min: f64, max: f64 },
    AtLeast { column: String, value: f64 },
    AtMost { column: String, value: f64 },
    Equals { column: String, value: f64 },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Between { column, .. }
            | Predicate::AtLeast { column, .. }
            | Predicate::AtMost { column, .. }
            | Predicate::Equals { column, .. } => column,
        }
    }

    fn expr(&self) -> Expr {
        match self {
            Predicate::Between { column, min, max } =>
                col(column.as_str()).gt_eq(lit(*min)).and(col(column.as_str()).lt_eq(lit(*max))),
            Predicate::AtLeast { column, value } => col(column.as_str()).gt_eq(lit(*value)),
            Predicate::AtMost { column, value } => col(column.as_str()).lt_eq(lit(*value)),
            Predicate::Equals { column, value } => col(column.as_str()).eq(lit(*value)),
        }
    }
}

/// A named conjunction of predicates, e.g. "pre-2010 harvest samples".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleFilter {
    pub name: String,
    pub predicates: Vec<Predicate>,
}

impl SampleFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), predicates: Vec::new() }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Keep the rows matching every predicate. An empty filter keeps everything.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let columns = self.predicates.iter().map(Predicate::column).collect::<Vec<_>>();
        require_columns(df, &columns, Stage::Filter)?;

        let Some(condition) = self.predicates.iter().map(Predicate::expr).reduce(|a, b| a.and(b)) else {
            return Ok(df.clone());
        };

        let filtered = df.clone().lazy().filter(condition).collect()?;
        log::debug!("[filter] `{}` kept {} of {} rows", self.name, filtered.height(), df.height());
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;
    use crate::error::FeatureError;

    fn samples() -> DataFrame {
        df!(
            "year" => [2005i64, 2009, 2010, 2014],
            "month" => [8i64, 7, 9, 3],
            "severity" => [0.1, 0.0, 0.2, 0.05],
        ).unwrap()
    }

    #[test]
    fn era_and_season_predicates_combine() {
        let filter = SampleFilter::new("late-summer, 2009 onwards")
            .with(Predicate::AtLeast { column: "year".into(), value: 2009.0 })
            .with(Predicate::Between { column: "month".into(), min: 7.0, max: 9.0 });

        let out = filter.apply(&samples()).unwrap();
        let years = out.column("year").unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(years, vec![2009, 2010]);
    }

    #[test]
    fn empty_filter_keeps_all_rows() {
        assert_eq!(SampleFilter::default().apply(&samples()).unwrap().height(), 4);
    }

    #[test]
    fn filters_deserialize_from_json() {
        let filter: SampleFilter = serde_json::from_str(r#"{
            "name": "pre-2010",
            "predicates": [{ "op": "at_most", "column": "year", "value": 2009 }]
        }"#).unwrap();
        assert_eq!(filter.apply(&samples()).unwrap().height(), 2);
    }

    #[test]
    fn unknown_column_is_reported() {
        let filter = SampleFilter::new("x").with(Predicate::Equals { column: "crop".into(), value: 1.0 });
        assert!(matches!(filter.apply(&samples()), Err(FeatureError::MissingColumn { stage: Stage::Filter, .. })));
    }
}
