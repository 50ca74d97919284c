pub mod calendar;
pub mod ergot;
pub mod neighbors;

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::AdjacencyArgs;
use crate::config::IoConfig;
use crate::geom::{compute_neighbors, AdjacencyMap, AdjacencyOptions};
use crate::io::{read_csv, read_districts_geojson};

/// Reject stdout and refuse to clobber an existing file unless forced.
pub(crate) fn check_output(path: &Path, force: bool) -> Result<()> {
    if path == Path::new("-") { bail!("stdout is not supported."); }
    if path.is_dir() {
        bail!("Output path is a directory: {}", path.display());
    }
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    Ok(())
}

impl From<&AdjacencyArgs> for AdjacencyOptions {
    fn from(args: &AdjacencyArgs) -> Self {
        Self { rule: args.rule.into(), symmetric: args.symmetric }
    }
}

/// Adjacency from the configured source: a precomputed list wins over boundaries.
pub(crate) fn load_neighbors(io: &IoConfig, options: &AdjacencyOptions) -> Result<AdjacencyMap> {
    match (&io.neighbors, &io.districts) {
        (Some(path), _) => neighbors_from_csv(path, options.symmetric),
        (None, Some(path)) => neighbors_from_geojson(path, &io.id_property, options),
        (None, None) => bail!("either a districts file or a neighbors list is required"),
    }
}

/// Adjacency from district boundaries.
fn neighbors_from_geojson(path: &Path, id_property: &str, options: &AdjacencyOptions) -> Result<AdjacencyMap> {
    let districts = read_districts_geojson(path, id_property)?;
    log::info!("[neighbors] {} districts from {}", districts.len(), path.display());
    compute_neighbors(&districts, options)
        .with_context(|| format!("Failed to compute adjacency for {}", path.display()))
}

/// Adjacency from a `district,neighbor` CSV written by the `neighbors` command.
fn neighbors_from_csv(path: &Path, symmetric: bool) -> Result<AdjacencyMap> {
    let df = read_csv(path)?;
    let mut neighbors = AdjacencyMap::from_frame(&df)
        .with_context(|| format!("Invalid adjacency list in {:?}", path))?;
    if symmetric { neighbors.symmetrize(); }
    log::info!("[neighbors] {} districts from {}", neighbors.len(), path.display());
    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_checks() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("out.csv");
        std::fs::write(&existing, "x\n").unwrap();

        assert!(check_output(Path::new("-"), true).is_err());
        assert!(check_output(dir.path(), true).is_err());
        assert!(check_output(&existing, false).is_err());
        assert!(check_output(&existing, true).is_ok());
        assert!(check_output(&dir.path().join("new.csv"), false).is_ok());
    }

    #[test]
    fn adjacency_source_is_required() {
        let io = IoConfig::new("out.csv");
        assert!(load_neighbors(&io, &AdjacencyOptions::default()).is_err());
    }

    #[test]
    fn neighbor_list_is_symmetrized_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adjacency.csv");
        std::fs::write(&path, "district,neighbor\n1,2\n2,\n").unwrap();

        let io = IoConfig { neighbors: Some(path), ..IoConfig::new("out.csv") };
        let raw = load_neighbors(&io, &AdjacencyOptions::default()).unwrap();
        assert!(!raw.is_symmetric());

        let options = AdjacencyOptions { symmetric: true, ..AdjacencyOptions::default() };
        assert!(load_neighbors(&io, &options).unwrap().contains(2, 1));
    }
}
