use anyhow::Result;

use crate::cli::{Cli, NeighborsArgs};
use crate::config::IoConfig;
use crate::io::write_csv;
use super::{check_output, load_neighbors};

pub fn run(_cli: &Cli, args: &NeighborsArgs) -> Result<()> {
    let io = IoConfig {
        districts: Some(args.districts.clone()),
        id_property: args.adjacency.id_property.clone(),
        ..IoConfig::new(&args.output)
    };
    check_output(&io.output, args.force)?;

    let neighbors = load_neighbors(&io, &(&args.adjacency).into())?;
    let pairs: usize = neighbors.districts().map(|d| neighbors.neighbors(d).count()).sum();
    log::info!("[neighbors] {} districts, {} neighbor pairs", neighbors.len(), pairs);

    let mut df = neighbors.to_frame()?;
    write_csv(&mut df, &io.output)?;
    println!("Wrote adjacency -> {}", io.output.display());
    Ok(())
}
