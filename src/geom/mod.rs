mod adjacency;
mod envelope;

use envelope::DistrictEnvelope;
pub use adjacency::{compute_neighbors, AdjacencyMap, AdjacencyOptions, AdjacencyRule, District};
