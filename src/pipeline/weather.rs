use polars::prelude::DataFrame;

use crate::calendar::{aggregate_by_calendar, reshape_by_calendar, AggregationConfig, ReshapeRequest};
use crate::error::Result;
use super::PipelineContext;

/// Raw dated observations (weather, soil moisture) -> one wide row per (year, district).
///
/// Observations are reduced per calendar bucket with the configured statistics,
/// then spread over the full `ctx.years × ctx.districts` grid with one
/// `"{bucket}:{attr}_{stat}"` column per bucket in the vocabulary.
pub fn run_calendar_pipeline(ctx: &PipelineContext, observations: &DataFrame, config: &AggregationConfig) -> Result<DataFrame> {
    let aggregates = aggregate_by_calendar(observations, config)?;

    let request = ReshapeRequest {
        units: config.unit.all_keys(config.overflow),
        districts: ctx.districts.clone(),
        years: ctx.years.clone(),
        attributes: Some(config.output_attributes()),
        key_column: Some(config.unit.column_name().to_string()),
    };
    let wide = reshape_by_calendar(&aggregates, &request)?;

    log::info!("[calendar] {:?}: {} rows x {} columns", config.unit, wide.height(), wide.width());
    Ok(wide)
}
