//! Column access helpers shared by every stage.

use polars::prelude::{Column, DataFrame, DataType};

use crate::error::{FeatureError, Result, Stage};

/// Fail with `MissingColumn` for the first of `columns` absent from `df`.
pub(crate) fn require_columns(df: &DataFrame, columns: &[&str], stage: Stage) -> Result<()> {
    columns.iter()
        .find(|&&name| df.get_column_index(name).is_none())
        .map_or(Ok(()), |&name| Err(FeatureError::missing(stage, name)))
}

/// Look up a column, reporting the stage if it is absent.
pub(crate) fn column<'a>(df: &'a DataFrame, name: &str, stage: Stage) -> Result<&'a Column> {
    df.column(name).map_err(|_| FeatureError::missing(stage, name))
}

/// Read an integer key column; nulls are rejected since every row needs a key.
pub(crate) fn key_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<i64>> {
    let values = column(df, name, stage)?.cast(&DataType::Int64)?;
    values.i64()?.into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| {
            FeatureError::invalid(stage, format!("column `{name}` has a null or non-integer key at row {row}"))
        }))
        .collect()
}

/// Read a numeric column as `f64`, keeping nulls.
pub(crate) fn float_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<Option<f64>>> {
    let values = column(df, name, stage)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Read a column as strings, keeping nulls.
pub(crate) fn string_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<Option<String>>> {
    let values = column(df, name, stage)?.cast(&DataType::String)?;
    Ok(values.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Distinct values of an integer key column, ascending.
pub fn distinct_keys(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let mut keys = key_values(df, name, Stage::Aggregate)?;
    keys.sort_unstable();
    keys.dedup();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    #[test]
    fn require_columns_reports_first_missing() {
        let df = df!("year" => [2010i64], "district" => [1i64]).unwrap();
        assert!(require_columns(&df, &["year", "district"], Stage::Lag).is_ok());

        let err = require_columns(&df, &["year", "severity", "incidence"], Stage::Lag).unwrap_err();
        match err {
            FeatureError::MissingColumn { stage, column } => {
                assert_eq!(stage, Stage::Lag);
                assert_eq!(column, "severity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn key_values_cast_floats_and_reject_nulls() {
        let df = df!("district" => [Some(3.0f64), Some(4.0)]).unwrap();
        assert_eq!(key_values(&df, "district", Stage::Lag).unwrap(), vec![3, 4]);

        let df = df!("district" => [Some(3i64), None]).unwrap();
        assert!(matches!(key_values(&df, "district", Stage::Lag), Err(FeatureError::InvalidInput { .. })));
    }

    #[test]
    fn distinct_keys_are_sorted_and_unique() {
        let df = df!("year" => [2012i64, 2010, 2012, 2011]).unwrap();
        assert_eq!(distinct_keys(&df, "year").unwrap(), vec![2010, 2011, 2012]);
    }
}
