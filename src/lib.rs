#![doc = "Spatiotemporal feature tables for crop disease, weather and soil moisture"]
pub mod binning;
pub mod calendar;
pub mod config;
pub mod error;
pub mod filter;
pub mod geom;
pub mod io;
pub mod lag;
pub mod pipeline;
mod table;

pub mod cli;
pub mod commands;

#[doc(inline)]
pub use error::{FeatureError, Result, Stage};

#[doc(inline)]
pub use geom::{compute_neighbors, AdjacencyMap, AdjacencyOptions, AdjacencyRule, District};

#[doc(inline)]
pub use lag::{build_lagged_features, LagConfig, PresenceRule};

#[doc(inline)]
pub use binning::{assign_arbitrary_bins, assign_quartile_bins, bin_columns, BinMode, BinSpec, Quartile};

#[doc(inline)]
pub use calendar::{aggregate_by_calendar, reshape_by_calendar, AggregationConfig, CalendarKey, CalendarUnit, OverflowPolicy, ReshapeRequest};

#[doc(inline)]
pub use filter::{Predicate, SampleFilter};

#[doc(inline)]
pub use pipeline::{run_calendar_pipeline, run_ergot_pipeline, ErgotConfig, PipelineContext};

#[doc(inline)]
pub use table::distinct_keys;
