use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use geo::{MultiPolygon, Relate};
use polars::prelude::{Column, DataFrame, DataType};
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result, Stage};
use crate::table::{column, require_columns};
use super::DistrictEnvelope;

/// A crop-reporting district and its boundary, in a projected coordinate system.
#[derive(Debug, Clone)]
pub struct District {
    pub id: i64,
    pub shape: MultiPolygon<f64>,
}

impl District {
    pub fn new(id: i64, shape: MultiPolygon<f64>) -> Self {
        Self { id, shape }
    }
}

/// Which boundary contact counts as adjacency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyRule {
    /// Boundaries intersect and interiors are disjoint (a shared corner is enough).
    #[default]
    Touches,
    /// Touches, and the shared boundary has dimension 1 (a shared edge).
    Rook,
}

impl AdjacencyRule {
    /// Evaluate the rule for the ordered pair (`district`, `other`).
    fn holds(&self, district: &District, other: &District) -> Result<bool> {
        let im = district.shape.relate(&other.shape);
        match self {
            AdjacencyRule::Touches => Ok(im.is_touches()),
            // In the 9-char DE-9IM string, index 4 is Boundary/Boundary.
            AdjacencyRule::Rook => Ok(im.is_touches() && im.matches("****1****")
                .map_err(|e| FeatureError::GeometryPredicate {
                    district: district.id,
                    other: other.id,
                    message: e.to_string(),
                })?),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyOptions {
    pub rule: AdjacencyRule,
    /// Mirror every edge so that `b ∈ N(a)` implies `a ∈ N(b)`.
    /// Off by default: the raw predicate output is returned and asymmetries are only logged.
    pub symmetric: bool,
}

/// Mapping from district id to the set of neighboring district ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyMap {
    neighbors: BTreeMap<i64, BTreeSet<i64>>,
}

impl AdjacencyMap {
    /// Construct a map with an empty neighbor set for each id.
    pub fn with_districts(ids: impl IntoIterator<Item = i64>) -> Self {
        Self { neighbors: ids.into_iter().map(|id| (id, BTreeSet::new())).collect() }
    }

    /// Record `neighbor` as adjacent to `district` (one direction only).
    pub fn insert(&mut self, district: i64, neighbor: i64) {
        self.neighbors.entry(district).or_default().insert(neighbor);
    }

    #[inline] pub fn len(&self) -> usize { self.neighbors.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.neighbors.is_empty() }

    /// Ids of every district known to the map, ascending.
    pub fn districts(&self) -> impl Iterator<Item = i64> + '_ {
        self.neighbors.keys().copied()
    }

    /// Neighbors of `district`, ascending. Unknown districts have none.
    pub fn neighbors(&self, district: i64) -> impl Iterator<Item = i64> + '_ {
        self.neighbors.get(&district).into_iter().flatten().copied()
    }

    /// Neighbor set of `district`, if the district is known.
    pub fn get(&self, district: i64) -> Option<&BTreeSet<i64>> {
        self.neighbors.get(&district)
    }

    pub fn contains(&self, district: i64, neighbor: i64) -> bool {
        self.neighbors.get(&district).is_some_and(|set| set.contains(&neighbor))
    }

    /// Ordered pairs (a, b) with `b ∈ N(a)` but `a ∉ N(b)`.
    pub fn asymmetric_pairs(&self) -> Vec<(i64, i64)> {
        self.neighbors.iter()
            .flat_map(|(&a, set)| set.iter().map(move |&b| (a, b)))
            .filter(|&(a, b)| !self.contains(b, a))
            .collect()
    }

    pub fn is_symmetric(&self) -> bool { self.asymmetric_pairs().is_empty() }

    /// Add the reverse of every edge.
    pub fn symmetrize(&mut self) {
        for (a, b) in self.asymmetric_pairs() {
            self.insert(b, a);
        }
    }

    /// Long `district,neighbor` table. Districts without neighbors get a single row with a null neighbor.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let (districts, neighbors) = self.neighbors.iter()
            .flat_map(|(&district, set)| {
                let rows: Vec<(i64, Option<i64>)> = if set.is_empty() {
                    vec![(district, None)]
                } else {
                    set.iter().map(|&n| (district, Some(n))).collect()
                };
                rows
            })
            .unzip::<_, _, Vec<_>, Vec<_>>();

        Ok(DataFrame::new(vec![
            Column::new("district".into(), districts),
            Column::new("neighbor".into(), neighbors),
        ])?)
    }

    /// Inverse of [`AdjacencyMap::to_frame`].
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        require_columns(df, &["district", "neighbor"], Stage::Adjacency)?;
        let districts = column(df, "district", Stage::Adjacency)?.cast(&DataType::Int64)?;
        let neighbors = column(df, "neighbor", Stage::Adjacency)?.cast(&DataType::Int64)?;

        let mut map = Self::default();
        for (district, neighbor) in districts.i64()?.into_iter().zip(neighbors.i64()?.into_iter()) {
            let district = district
                .ok_or_else(|| FeatureError::invalid(Stage::Adjacency, "null district in adjacency table"))?;
            map.neighbors.entry(district).or_default().extend(neighbor);
        }
        Ok(map)
    }
}

/// Compute the neighbor set of every district.
///
/// Each ordered pair (A, B) with A ≠ B is tested independently with `options.rule`;
/// an R-tree over bounding boxes skips pairs whose envelopes cannot meet.
/// No district is ever recorded as its own neighbor.
pub fn compute_neighbors(districts: &[District], options: &AdjacencyOptions) -> Result<AdjacencyMap> {
    let mut seen = AHashSet::with_capacity(districts.len());
    if let Some(dup) = districts.iter().find(|d| !seen.insert(d.id)) {
        return Err(FeatureError::DuplicateDistrict(dup.id));
    }

    // Empty geometries have no bounding box and therefore no neighbors.
    let envelopes = districts.iter().enumerate()
        .filter_map(|(i, district)| DistrictEnvelope::of(i, district))
        .collect::<Vec<_>>();
    let rtree = RTree::bulk_load(envelopes.clone());

    let mut map = AdjacencyMap::with_districts(districts.iter().map(|d| d.id));
    for envelope in &envelopes {
        let i = envelope.position();
        let mut candidates = rtree.locate_in_envelope_intersecting(&envelope.search_window())
            .map(DistrictEnvelope::position)
            .filter(|&j| j != i)
            .collect::<Vec<_>>();
        candidates.sort_unstable();

        for j in candidates {
            if options.rule.holds(&districts[i], &districts[j])? {
                map.insert(districts[i].id, districts[j].id);
            }
        }
    }

    let asymmetric = map.asymmetric_pairs();
    if !asymmetric.is_empty() {
        if options.symmetric {
            log::info!("[adjacency] symmetrizing {} one-directional neighbor pairs", asymmetric.len());
            map.symmetrize();
        } else {
            log::warn!("[adjacency] {} one-directional neighbor pairs left as computed: {:?}", asymmetric.len(), asymmetric);
        }
    }

    log::debug!("[adjacency] {} districts, {} directed edges",
        map.len(), map.neighbors.values().map(BTreeSet::len).sum::<usize>());

    Ok(map)
}
