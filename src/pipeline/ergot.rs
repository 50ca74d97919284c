use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::binning::{bin_columns, BinSpec};
use crate::error::Result;
use crate::filter::SampleFilter;
use crate::lag::{build_lagged_features, LagConfig};
use super::PipelineContext;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErgotConfig {
    /// Season/era selection applied to samples before anything else.
    pub filter: Option<SampleFilter>,
    pub lag: LagConfig,
    pub bins: BinSpec,
}

/// Disease samples -> one flat feature row per (year, district).
///
/// Stages: filter, lag join over `ctx.neighbors`, then binning of the
/// configured columns (by default `percnt_true` and `sum_severity`).
pub fn run_ergot_pipeline(ctx: &PipelineContext, samples: &DataFrame, config: &ErgotConfig) -> Result<DataFrame> {
    let samples = match &config.filter {
        Some(filter) => filter.apply(samples)?,
        None => samples.clone(),
    };

    let features = build_lagged_features(&samples, &ctx.neighbors, &config.lag)?;
    let features = bin_columns(&features, &config.bins)?;

    log::info!("[ergot] {} rows x {} columns", features.height(), features.width());
    Ok(features)
}
