use crate::error::Result;
use crate::geom::{compute_neighbors, AdjacencyMap, AdjacencyOptions, District};

/// Inputs shared by every pipeline run over the same study area.
///
/// Built once by the caller and passed by reference; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// District ids, ascending.
    pub districts: Vec<i64>,
    /// Years covered by wide outputs, ascending.
    pub years: Vec<i64>,
    pub neighbors: AdjacencyMap,
}

impl PipelineContext {
    /// Compute adjacency from district geometry.
    pub fn from_geometry(districts: &[District], years: impl IntoIterator<Item = i64>, options: &AdjacencyOptions) -> Result<Self> {
        let neighbors = compute_neighbors(districts, options)?;
        Ok(Self::from_adjacency(neighbors, years))
    }

    /// Reuse a previously computed adjacency map; its keys define the district set.
    pub fn from_adjacency(neighbors: AdjacencyMap, years: impl IntoIterator<Item = i64>) -> Self {
        let mut years = years.into_iter().collect::<Vec<_>>();
        years.sort_unstable();
        years.dedup();
        Self {
            districts: neighbors.districts().collect(),
            years,
            neighbors,
        }
    }

    /// Replace the year range, e.g. once the observed years are known.
    pub fn with_years(mut self, years: impl IntoIterator<Item = i64>) -> Self {
        self.years = years.into_iter().collect();
        self.years.sort_unstable();
        self.years.dedup();
        self
    }
}
