//! Quartile and fixed-threshold binning of derived metrics.

use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result, Stage};
use crate::table::{float_values, require_columns};

/// One of four mutually exclusive quartile bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quartile {
    Q1 = 1,
    Q2 = 2,
    Q3 = 3,
    Q4 = 4,
}

impl Quartile {
    #[inline] pub fn number(&self) -> i32 { *self as i32 }
}

/// Linear-interpolation percentile of an ascending, NaN-free slice (`p` in `[0, 100]`).
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() { return None }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// The 25th/50th/75th percentile boundaries of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuartileCutoffs {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

impl QuartileCutoffs {
    /// Cutoffs over the non-NaN values, or `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.iter().copied().filter(|v| !v.is_nan()).collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            q25: percentile(&sorted, 25.0)?,
            q50: percentile(&sorted, 50.0)?,
            q75: percentile(&sorted, 75.0)?,
        })
    }

    /// Ties at a boundary fall into the lower bin; NaN falls into `Q1`.
    pub fn classify(&self, value: f64) -> Quartile {
        if value.is_nan() || value <= self.q25 { Quartile::Q1 }
        else if value <= self.q50 { Quartile::Q2 }
        else if value <= self.q75 { Quartile::Q3 }
        else { Quartile::Q4 }
    }
}

/// Assign every value to a quartile of the full distribution.
pub fn assign_quartile_bins(values: &[f64]) -> Vec<Quartile> {
    match QuartileCutoffs::from_values(values) {
        Some(cutoffs) => values.iter().map(|&v| cutoffs.classify(v)).collect(),
        None => vec![Quartile::Q1; values.len()],
    }
}

/// Bin index = number of cutpoints `<= value`; NaN maps to 0.
pub fn assign_arbitrary_bins(values: &[f64], cutpoints: &[f64]) -> Result<Vec<usize>> {
    if cutpoints.iter().any(|c| c.is_nan()) || cutpoints.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FeatureError::invalid(Stage::Binning,
            format!("cutpoints must be strictly ascending, got {cutpoints:?}")));
    }

    Ok(values.iter()
        .map(|&v| if v.is_nan() { 0 } else { cutpoints.partition_point(|&c| c <= v) })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BinMode {
    /// Adds `{column}_quartile` with values 1–4.
    #[default]
    Quartile,
    /// Adds `{column}_bin` with values `0..=cutpoints.len()`.
    Arbitrary { cutpoints: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinSpec {
    pub columns: Vec<String>,
    pub mode: BinMode,
}

impl Default for BinSpec {
    fn default() -> Self {
        Self {
            columns: vec!["percnt_true".to_string(), "sum_severity".to_string()],
            mode: BinMode::Quartile,
        }
    }
}

/// Append one bin column per configured source column.
pub fn bin_columns(df: &DataFrame, spec: &BinSpec) -> Result<DataFrame> {
    require_columns(df, &spec.columns.iter().map(String::as_str).collect::<Vec<_>>(), Stage::Binning)?;

    let mut out = df.clone();
    for name in &spec.columns {
        let values = float_values(df, name, Stage::Binning)?.into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect::<Vec<_>>();

        let column = match &spec.mode {
            BinMode::Quartile => Column::new(format!("{name}_quartile").into(),
                assign_quartile_bins(&values).iter().map(Quartile::number).collect::<Vec<_>>()),
            BinMode::Arbitrary { cutpoints } => Column::new(format!("{name}_bin").into(),
                assign_arbitrary_bins(&values, cutpoints)?.into_iter().map(|b| b as i32).collect::<Vec<_>>()),
        };
        out.with_column(column)?;
    }
    Ok(out)
}
