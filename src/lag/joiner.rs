use ahash::AHashMap;
use polars::prelude::{Column, DataFrame};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{FeatureError, Result, Stage};
use crate::geom::AdjacencyMap;
use crate::table::{float_values, key_values, require_columns};
use super::{PresenceRule, Sample, SelectionStats};

/// The (year, district) aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityYear {
    pub year: i64,
    pub district: i64,
}

/// Current, neighbor and prior-year statistics for one entity-year.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFeatureSet {
    pub entity: EntityYear,
    pub current: SelectionStats,
    pub neighbors: SelectionStats,
    /// `lags[k - 1]` covers `year - k`.
    pub lags: SmallVec<[SelectionStats; 3]>,
}

impl LaggedFeatureSet {
    fn selections_mut(&mut self) -> impl Iterator<Item = &mut SelectionStats> {
        [&mut self.current, &mut self.neighbors].into_iter().chain(self.lags.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagConfig {
    pub year_column: String,
    pub district_column: String,
    /// Boolean (or 0/1) column marking a positive sample.
    pub indicator_column: String,
    /// Continuous severity measurement.
    pub severity_column: String,
    pub lag_depth: usize,
    pub presence: PresenceRule,
    /// Also replace undefined medians with 0 (ratios are always filled).
    pub fill_median: bool,
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            year_column: "year".to_string(),
            district_column: "district".to_string(),
            indicator_column: "incidence".to_string(),
            severity_column: "severity".to_string(),
            lag_depth: 3,
            presence: PresenceRule::default(),
            fill_median: false,
        }
    }
}

/// Column suffixes in output order: current, neighbors, then each lag.
pub fn selection_suffixes(lag_depth: usize) -> Vec<String> {
    ["".to_string(), "_neighbors".to_string()].into_iter()
        .chain((1..=lag_depth).map(|k| format!("_prev{k}")))
        .collect()
}

/// Compute one [`LaggedFeatureSet`] per distinct (year, district) in `samples`, sorted by key.
pub fn lagged_feature_sets(samples: &DataFrame, neighbors: &AdjacencyMap, config: &LagConfig) -> Result<Vec<LaggedFeatureSet>> {
    require_columns(samples, &[
        config.year_column.as_str(),
        config.district_column.as_str(),
        config.indicator_column.as_str(),
        config.severity_column.as_str(),
    ], Stage::Lag)?;

    let years = key_values(samples, &config.year_column, Stage::Lag)?;
    let districts = key_values(samples, &config.district_column, Stage::Lag)?;
    let indicators = float_values(samples, &config.indicator_column, Stage::Lag)?;
    let severities = float_values(samples, &config.severity_column, Stage::Lag)?;

    let rows = indicators.iter().zip(&severities)
        .map(|(&indicator, &severity)| Sample { positive: indicator.is_some_and(|v| v > 0.0), severity })
        .collect::<Vec<_>>();

    let mut index = AHashMap::<EntityYear, Vec<usize>>::new();
    for (row, (&year, &district)) in years.iter().zip(&districts).enumerate() {
        index.entry(EntityYear { year, district }).or_default().push(row);
    }

    let mut entities = index.keys().copied().collect::<Vec<_>>();
    entities.sort_unstable();

    let (index, rows) = (&index, &rows);
    let select = move |year: i64, district: i64| {
        index.get(&EntityYear { year, district }).into_iter().flatten().map(move |&row| &rows[row])
    };

    let mut sets = entities.par_iter()
        .map(|&entity| {
            let EntityYear { year, district } = entity;
            LaggedFeatureSet {
                entity,
                current: SelectionStats::from_samples(select(year, district), config.presence),
                neighbors: SelectionStats::from_samples(
                    neighbors.neighbors(district).flat_map(|n| select(year, n)),
                    config.presence,
                ),
                lags: (1..=config.lag_depth as i64)
                    .map(|k| SelectionStats::from_samples(select(year - k, district), config.presence))
                    .collect(),
            }
        })
        .collect::<Vec<_>>();

    let mut empty = 0usize;
    for set in &mut sets {
        for stats in set.selections_mut() {
            empty += usize::from(stats.is_empty());
            stats.fill_undefined(config.fill_median);
        }
    }
    if empty > 0 {
        log::debug!("[lag] {empty} empty neighbor/lag selections filled with defaults");
    }

    log::info!("[lag] {} samples -> {} entity-years (lag depth {})", samples.height(), sets.len(), config.lag_depth);
    Ok(sets)
}

/// Flatten feature sets into `year, district` plus four columns per selection:
/// `present{sfx}`, `percnt_true{sfx}`, `sum_severity{sfx}`, `median_severity{sfx}`.
///
/// Fails if a set carries fewer than `lag_depth` lags.
pub fn feature_sets_to_frame(sets: &[LaggedFeatureSet], lag_depth: usize) -> Result<DataFrame> {
    if let Some(short) = sets.iter().find(|set| set.lags.len() < lag_depth) {
        return Err(FeatureError::invalid(Stage::Lag, format!(
            "entity year={} district={} has {} lags, {lag_depth} requested",
            short.entity.year, short.entity.district, short.lags.len()
        )));
    }

    let mut columns = vec![
        Column::new("year".into(), sets.iter().map(|s| s.entity.year).collect::<Vec<_>>()),
        Column::new("district".into(), sets.iter().map(|s| s.entity.district).collect::<Vec<_>>()),
    ];

    for (i, suffix) in selection_suffixes(lag_depth).iter().enumerate() {
        let stats = sets.iter()
            .map(|set| match i {
                0 => &set.current,
                1 => &set.neighbors,
                k => &set.lags[k - 2],
            })
            .collect::<Vec<_>>();

        columns.push(Column::new(format!("present{suffix}").into(),
            stats.iter().map(|s| s.present).collect::<Vec<_>>()));
        columns.push(Column::new(format!("percnt_true{suffix}").into(),
            stats.iter().map(|s| s.percnt_true).collect::<Vec<_>>()));
        columns.push(Column::new(format!("sum_severity{suffix}").into(),
            stats.iter().map(|s| s.sum_severity).collect::<Vec<_>>()));
        columns.push(Column::new(format!("median_severity{suffix}").into(),
            stats.iter().map(|s| s.median_severity).collect::<Vec<_>>()));
    }

    Ok(DataFrame::new(columns)?)
}

/// One row per (year, district) present in `samples` with current, neighbor and lag features.
pub fn build_lagged_features(samples: &DataFrame, neighbors: &AdjacencyMap, config: &LagConfig) -> Result<DataFrame> {
    let sets = lagged_feature_sets(samples, neighbors, config)?;
    feature_sets_to_frame(&sets, config.lag_depth)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    fn chain_map() -> AdjacencyMap {
        // 1 - 2 - 3
        let mut map = AdjacencyMap::with_districts([1, 2, 3]);
        for (a, b) in [(1, 2), (2, 1), (2, 3), (3, 2)] {
            map.insert(a, b);
        }
        map
    }

    fn bool_at(df: &DataFrame, name: &str, row: usize) -> bool {
        df.column(name).unwrap().bool().unwrap().get(row).unwrap()
    }

    fn f64_at(df: &DataFrame, name: &str, row: usize) -> f64 {
        df.column(name).unwrap().f64().unwrap().get(row).unwrap()
    }

    #[test]
    fn current_year_presence_and_proportion() {
        let samples = df!(
            "year" => [2010i64, 2010],
            "district" => [1i64, 1],
            "incidence" => [true, false],
            "severity" => [0.1, 0.0],
        ).unwrap();

        let out = build_lagged_features(&samples, &chain_map(), &LagConfig::default()).unwrap();
        assert_eq!(out.height(), 1);
        assert!(bool_at(&out, "present", 0));
        assert_eq!(f64_at(&out, "percnt_true", 0), 0.5);
    }

    #[test]
    fn absent_prior_year_reads_as_zero() {
        let samples = df!(
            "year" => [2010i64],
            "district" => [1i64],
            "incidence" => [1i64],
            "severity" => [0.2],
        ).unwrap();

        let out = build_lagged_features(&samples, &chain_map(), &LagConfig::default()).unwrap();
        assert!(!bool_at(&out, "present_prev1", 0));
        assert_eq!(f64_at(&out, "percnt_true_prev1", 0), 0.0);
        assert_eq!(f64_at(&out, "sum_severity_prev3", 0), 0.0);
        assert!(f64_at(&out, "median_severity_prev2", 0).is_nan());
    }

    #[test]
    fn neighbors_and_lags_pick_the_right_rows() {
        let samples = df!(
            "year" => [2010i64, 2010, 2010, 2009, 2008, 2010],
            "district" => [2i64, 1, 3, 2, 2, 9],
            "incidence" => [false, true, false, true, false, true],
            "severity" => [0.0, 0.5, 0.25, 0.3, 0.0, 9.0],
        ).unwrap();

        let sets = lagged_feature_sets(&samples, &chain_map(), &LagConfig::default()).unwrap();
        let entity = sets.iter().find(|s| s.entity == EntityYear { year: 2010, district: 2 }).unwrap();

        assert!(!entity.current.present);
        assert_eq!(entity.neighbors.rows, 2);
        assert!(entity.neighbors.present);
        assert_eq!(entity.neighbors.percnt_true, 0.5);
        assert_eq!(entity.neighbors.sum_severity, 0.75);
        assert_eq!(entity.neighbors.median_severity, 0.375);
        assert!(entity.lags[0].present);
        assert!(!entity.lags[1].present);
        assert_eq!(entity.lags[1].rows, 1);
        assert!(entity.lags[2].is_empty());
    }

    #[test]
    fn one_row_per_entity_year() {
        let samples = df!(
            "year" => [2011i64, 2010, 2011, 2010, 2011],
            "district" => [1i64, 1, 1, 2, 2],
            "incidence" => [true, false, true, false, true],
            "severity" => [0.1, 0.0, 0.1, 0.0, 0.1],
        ).unwrap();

        let out = build_lagged_features(&samples, &chain_map(), &LagConfig::default()).unwrap();
        assert_eq!(out.height(), 4);
        let keys = out.column("year").unwrap().i64().unwrap().into_no_null_iter()
            .zip(out.column("district").unwrap().i64().unwrap().into_no_null_iter())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![(2010, 1), (2010, 2), (2011, 1), (2011, 2)]);
        // year, district + 4 stats x (current, neighbors, 3 lags)
        assert_eq!(out.width(), 2 + 4 * 5);
    }

    #[test]
    fn severity_rule_uses_downgrade_threshold() {
        let samples = df!(
            "year" => [2012i64, 2012],
            "district" => [3i64, 3],
            "incidence" => [false, false],
            "severity" => [0.03, 0.02],
        ).unwrap();

        let count = build_lagged_features(&samples, &chain_map(), &LagConfig::default()).unwrap();
        assert!(!bool_at(&count, "present", 0));

        let config = LagConfig { presence: PresenceRule::downgrade(), lag_depth: 1, ..LagConfig::default() };
        let downgrade = build_lagged_features(&samples, &chain_map(), &config).unwrap();
        assert!(bool_at(&downgrade, "present", 0));
        assert!(downgrade.column("present_prev2").is_err());
    }

    #[test]
    fn missing_severity_column_fails() {
        let samples = df!("year" => [2012i64], "district" => [3i64], "incidence" => [true]).unwrap();
        let err = build_lagged_features(&samples, &chain_map(), &LagConfig::default()).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { stage: Stage::Lag, ref column } if column == "severity"));
    }

    #[test]
    fn rerun_is_identical() {
        let samples = df!(
            "year" => [2010i64, 2011, 2011, 2012],
            "district" => [1i64, 2, 1, 3],
            "incidence" => [true, false, true, true],
            "severity" => [0.1, 0.0, 0.3, 0.05],
        ).unwrap();
        let config = LagConfig { fill_median: true, ..LagConfig::default() };

        let first = build_lagged_features(&samples, &chain_map(), &config).unwrap();
        let second = build_lagged_features(&samples, &chain_map(), &config).unwrap();
        assert!(first.equals(&second));
    }

    #[test]
    fn frame_depth_beyond_computed_lags_is_rejected() {
        let samples = df!(
            "year" => [2010i64],
            "district" => [1i64],
            "incidence" => [true],
            "severity" => [0.2],
        ).unwrap();
        let config = LagConfig { lag_depth: 1, ..LagConfig::default() };
        let sets = lagged_feature_sets(&samples, &chain_map(), &config).unwrap();

        assert_eq!(feature_sets_to_frame(&sets, 1).unwrap().width(), 2 + 4 * 3);
        assert!(matches!(
            feature_sets_to_frame(&sets, 3),
            Err(FeatureError::InvalidInput { stage: Stage::Lag, .. })
        ));
    }
}
