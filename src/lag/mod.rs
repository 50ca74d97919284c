//! Same-year, neighbor and prior-year features per (year, district).

mod joiner;
mod stats;

pub use joiner::{
    build_lagged_features, feature_sets_to_frame, lagged_feature_sets, selection_suffixes,
    EntityYear, LagConfig, LaggedFeatureSet,
};
pub(crate) use stats::Sample;
pub use stats::{PresenceRule, SelectionStats, DOWNGRADE_THRESHOLD};
