use anyhow::{ensure, Context, Result};

use crate::calendar::observed_years;
use crate::cli::{CalendarArgs, Cli};
use crate::config::{load_json, CalendarConfig, IoConfig};
use crate::geom::AdjacencyMap;
use crate::io::{read_csv, write_csv};
use crate::pipeline::{run_calendar_pipeline, PipelineContext};
use crate::table::distinct_keys;
use super::check_output;

pub fn run(_cli: &Cli, args: &CalendarArgs) -> Result<()> {
    let io = IoConfig { input: Some(args.observations.clone()), ..IoConfig::new(&args.output) };
    check_output(&io.output, args.force)?;

    let mut config: CalendarConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => CalendarConfig::default(),
    };
    if !args.attributes.is_empty() {
        config.aggregation.attributes = args.attributes.clone();
    }
    ensure!(!config.aggregation.attributes.is_empty(), "no attributes to aggregate (use --attributes or a config file)");

    let input = io.input()?;
    let observations = read_csv(input)?;
    log::info!("[calendar] {} observations from {}", observations.height(), input.display());

    let years = match config.years.take() {
        Some(years) => years,
        None => observed_years(&observations, &config.aggregation.date_column, config.aggregation.unit)?,
    };
    let districts = match config.districts.take() {
        Some(districts) => districts,
        None => distinct_keys(&observations, &config.aggregation.district_column)?,
    };
    let ctx = PipelineContext::from_adjacency(AdjacencyMap::with_districts(districts), years);

    let mut wide = run_calendar_pipeline(&ctx, &observations, &config.aggregation)
        .with_context(|| format!("Calendar pipeline failed on {}", input.display()))?;

    write_csv(&mut wide, &io.output)?;
    println!("Wrote {} rows x {} columns -> {}", wide.height(), wide.width(), io.output.display());
    Ok(())
}
