use std::fmt;

use polars::error::PolarsError;
use thiserror::Error;

/// Pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Adjacency,
    Filter,
    Lag,
    Binning,
    Aggregate,
    Reshape,
}

impl Stage {
    pub fn to_str(&self) -> &'static str {
        match self {
            Stage::Adjacency => "adjacency",
            Stage::Filter => "filter",
            Stage::Lag => "lag",
            Stage::Binning => "binning",
            Stage::Aggregate => "aggregate",
            Stage::Reshape => "reshape",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Errors raised by the feature engine.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// An expected input column is absent.
    #[error("[{stage}] missing required column `{column}`")]
    MissingColumn { stage: Stage, column: String },

    /// More than one aggregate row exists for a single pivot key.
    #[error("[reshape] {count} aggregate rows for year={year} district={district} unit={unit}; expected at most one")]
    AmbiguousPivotKey { year: i64, district: i64, unit: String, count: usize },

    /// The geometry library rejected a predicate evaluation.
    #[error("[adjacency] geometry predicate failed for districts {district} and {other}: {message}")]
    GeometryPredicate { district: i64, other: i64, message: String },

    /// The same district id was supplied twice.
    #[error("[adjacency] duplicate district id {0}")]
    DuplicateDistrict(i64),

    /// Input that is structurally present but semantically unusable.
    #[error("[{stage}] {message}")]
    InvalidInput { stage: Stage, message: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl FeatureError {
    pub(crate) fn missing(stage: Stage, column: impl Into<String>) -> Self {
        FeatureError::MissingColumn { stage, column: column.into() }
    }

    pub(crate) fn invalid(stage: Stage, message: impl Into<String>) -> Self {
        FeatureError::InvalidInput { stage, message: message.into() }
    }
}

pub type Result<T, E = FeatureError> = std::result::Result<T, E>;
