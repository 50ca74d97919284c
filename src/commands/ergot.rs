use anyhow::{Context, Result};

use crate::cli::{Cli, ErgotArgs};
use crate::config::{load_json, IoConfig};
use crate::io::{read_csv, write_csv};
use crate::pipeline::{run_ergot_pipeline, ErgotConfig, PipelineContext};
use super::{check_output, load_neighbors};

pub fn run(_cli: &Cli, args: &ErgotArgs) -> Result<()> {
    let io = IoConfig {
        input: Some(args.samples.clone()),
        districts: args.districts.clone(),
        neighbors: args.neighbors.clone(),
        id_property: args.adjacency.id_property.clone(),
        ..IoConfig::new(&args.output)
    };
    check_output(&io.output, args.force)?;

    let config: ErgotConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => ErgotConfig::default(),
    };

    let neighbors = load_neighbors(&io, &(&args.adjacency).into())?;
    let ctx = PipelineContext::from_adjacency(neighbors, Vec::<i64>::new());

    let input = io.input()?;
    let samples = read_csv(input)?;
    log::info!("[ergot] {} samples from {}", samples.height(), input.display());

    let mut features = run_ergot_pipeline(&ctx, &samples, &config)
        .with_context(|| format!("Ergot pipeline failed on {}", input.display()))?;

    write_csv(&mut features, &io.output)?;
    println!("Wrote {} feature rows -> {}", features.height(), io.output.display());
    Ok(())
}
