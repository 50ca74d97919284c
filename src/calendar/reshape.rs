use ahash::AHashMap;
use polars::prelude::{Column, DataFrame, DataType};
use rayon::prelude::*;

use crate::error::{FeatureError, Result, Stage};
use crate::table::{column, float_values, key_values, require_columns, string_values};
use super::{CalendarKey, CalendarUnit};

/// Target shape of a wide calendar table.
#[derive(Debug, Clone, Default)]
pub struct ReshapeRequest {
    /// Buckets to emit, in column order.
    pub units: Vec<CalendarKey>,
    pub districts: Vec<i64>,
    pub years: Vec<i64>,
    /// Attribute columns to spread; every non-key column when `None`.
    pub attributes: Option<Vec<String>>,
    /// Name of the calendar key column; detected when `None`.
    pub key_column: Option<String>,
}

type PivotKey = (i64, i64, CalendarKey);

/// Locate the calendar key column and the vocabulary it uses.
///
/// The key column is the last column named after a unit (`day`, `week`, `month`),
/// falling back to the last attribute-free column: not `year` or `district`, not a
/// requested attribute, and (when no attributes are requested) not floating point.
/// The vocabulary comes from the column name, then from the shape of its values,
/// then from the requested units.
fn detect_key_column(aggregates: &DataFrame, request: &ReshapeRequest) -> Result<(String, CalendarUnit)> {
    let attribute_free = |column: &&Column| {
        let name = column.name().as_str();
        !matches!(name, "year" | "district") && match &request.attributes {
            Some(attrs) => !attrs.iter().any(|attr| attr == name),
            None => !column.dtype().is_float(),
        }
    };

    let key_column = match &request.key_column {
        Some(name) => name.clone(),
        None => aggregates.get_columns().iter().rev()
            .find(|column| CalendarUnit::from_column_name(column.name()).is_some())
            .or_else(|| aggregates.get_columns().iter().rev().find(attribute_free))
            .map(|column| column.name().to_string())
            .ok_or_else(|| FeatureError::missing(Stage::Reshape, "day|week|month"))?,
    };
    require_columns(aggregates, &[key_column.as_str()], Stage::Reshape)?;

    let requested = request.units.first().map(CalendarKey::unit);
    let detected = CalendarUnit::from_column_name(&key_column).or_else(|| {
        let values = string_values(aggregates, &key_column, Stage::Reshape).ok()?;
        CalendarUnit::detect_from_values(values.iter().flatten().map(String::as_str))
    });

    let unit = match (detected, requested) {
        (Some(found), Some(wanted)) if found != wanted => {
            return Err(FeatureError::invalid(Stage::Reshape, format!(
                "key column `{key_column}` holds {found:?} buckets but {wanted:?} buckets were requested"
            )));
        }
        (Some(unit), _) | (None, Some(unit)) => unit,
        (None, None) => return Err(FeatureError::invalid(Stage::Reshape, format!(
            "cannot infer the calendar vocabulary of column `{key_column}`"
        ))),
    };

    Ok((key_column, unit))
}

/// Parse every key cell of the aggregate table.
fn read_keys(aggregates: &DataFrame, key_column: &str, unit: CalendarUnit) -> Result<Vec<CalendarKey>> {
    let texts = match unit {
        CalendarUnit::Day => string_values(aggregates, key_column, Stage::Reshape)?,
        // Integer buckets may arrive as floats or strings; normalise through Int64.
        CalendarUnit::Week | CalendarUnit::Month => column(aggregates, key_column, Stage::Reshape)?
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()))
            .collect(),
    };

    texts.into_iter().enumerate()
        .map(|(row, text)| text.as_deref().and_then(|t| unit.parse_key(t)).ok_or_else(|| {
            FeatureError::invalid(Stage::Reshape, format!(
                "column `{key_column}` row {row}: {:?} is not a {unit:?} key", text
            ))
        }))
        .collect()
}

/// Index aggregate rows by (year, district, bucket); duplicates are an upstream grouping defect.
fn build_index(years: &[i64], districts: &[i64], keys: &[CalendarKey]) -> Result<AHashMap<PivotKey, usize>> {
    let mut index = AHashMap::<PivotKey, usize>::with_capacity(keys.len());
    let mut duplicates = AHashMap::<PivotKey, usize>::new();

    for (row, ((&year, &district), &key)) in years.iter().zip(districts).zip(keys).enumerate() {
        if index.insert((year, district, key), row).is_some() {
            *duplicates.entry((year, district, key)).or_insert(1) += 1;
        }
    }

    match duplicates.into_iter().min() {
        Some(((year, district, key), count)) => Err(FeatureError::AmbiguousPivotKey {
            year,
            district,
            unit: key.to_string(),
            count,
        }),
        None => Ok(index),
    }
}

/// Sorted, de-duplicated copy of a key list.
fn unique_sorted(values: &[i64]) -> Vec<i64> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values.dedup();
    values
}

/// Spread a long `(year, district, bucket, attrs...)` table into one row per (year, district).
///
/// Every pair of `request.years × request.districts` gets a row, observed or not.
/// Feature columns are named `"{bucket}:{attr}"`, buckets outer and attributes inner;
/// a bucket with no aggregate row, or a null value, reads as `0.0`.
pub fn reshape_by_calendar(aggregates: &DataFrame, request: &ReshapeRequest) -> Result<DataFrame> {
    require_columns(aggregates, &["year", "district"], Stage::Reshape)?;
    let (key_column, unit) = detect_key_column(aggregates, request)?;

    if let Some(key) = request.units.iter().find(|key| key.unit() != unit) {
        return Err(FeatureError::invalid(Stage::Reshape, format!("requested bucket {key} is not a {unit:?} key")));
    }

    let attributes = match &request.attributes {
        Some(attrs) => attrs.clone(),
        None => aggregates.get_column_names().into_iter()
            .map(|name| name.to_string())
            .filter(|name| !matches!(name.as_str(), "year" | "district") && *name != key_column)
            .collect(),
    };
    require_columns(aggregates, &attributes.iter().map(String::as_str).collect::<Vec<_>>(), Stage::Reshape)?;

    let years = key_values(aggregates, "year", Stage::Reshape)?;
    let districts = key_values(aggregates, "district", Stage::Reshape)?;
    let keys = read_keys(aggregates, &key_column, unit)?;
    let index = build_index(&years, &districts, &keys)?;

    let values = attributes.iter()
        .map(|attr| float_values(aggregates, attr, Stage::Reshape))
        .collect::<Result<Vec<_>>>()?;

    let mut units = Vec::with_capacity(request.units.len());
    for key in &request.units {
        if !units.contains(key) { units.push(*key) }
    }

    let rows = unique_sorted(&request.years).into_iter()
        .flat_map(|year| unique_sorted(&request.districts).into_iter().map(move |district| (year, district)))
        .collect::<Vec<_>>();

    let cells = units.iter()
        .flat_map(|&key| (0..attributes.len()).map(move |attr| (key, attr)))
        .collect::<Vec<_>>();

    let features = cells.par_iter()
        .map(|&(key, attr)| {
            let column = rows.iter()
                .map(|&(year, district)| index.get(&(year, district, key))
                    .and_then(|&row| values[attr][row])
                    .unwrap_or(0.0))
                .collect::<Vec<f64>>();
            Column::new(format!("{key}:{}", attributes[attr]).into(), column)
        })
        .collect::<Vec<_>>();

    let (row_years, row_districts) = rows.iter().copied().unzip::<_, _, Vec<_>, Vec<_>>();
    let mut columns = Vec::with_capacity(features.len() + 2);
    columns.push(Column::new("year".into(), row_years));
    columns.push(Column::new("district".into(), row_districts));
    columns.extend(features);

    log::debug!("[reshape] {} aggregate rows -> {} rows x {} features ({unit:?})",
        aggregates.height(), rows.len(), cells.len());

    Ok(DataFrame::new(columns)?)
}
