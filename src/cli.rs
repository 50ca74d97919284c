use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use crate::geom::AdjacencyRule;

/// Per-district yearly features for crop disease and weather models
#[derive(Parser, Debug)]
#[command(name = "agfeatures", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level selected by `-v` flags; `RUST_LOG` still overrides it.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the district adjacency list from boundaries
    Neighbors(NeighborsArgs),

    /// Build lagged disease features with neighbor context and bins
    Ergot(ErgotArgs),

    /// Aggregate dated observations into one wide calendar row per district-year
    Calendar(CalendarArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum)]
pub enum RuleArg {
    /// Any boundary contact, corners included
    #[default]
    Touches,
    /// Shared edge of positive length
    Rook,
}

impl From<RuleArg> for AdjacencyRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Touches => AdjacencyRule::Touches,
            RuleArg::Rook => AdjacencyRule::Rook,
        }
    }
}

/// Geometry options shared by commands that derive adjacency.
#[derive(Args, Debug, Clone)]
pub struct AdjacencyArgs {
    /// Feature property holding the integer district id
    #[arg(long, default_value = "district")]
    pub id_property: String,

    /// Contact required for two districts to be neighbors
    #[arg(long, value_enum, default_value_t = RuleArg::Touches)]
    pub rule: RuleArg,

    /// Add the reverse of every one-way neighbor pair
    #[arg(long)]
    pub symmetric: bool,
}

#[derive(Args, Debug)]
pub struct NeighborsArgs {
    /// District boundaries (GeoJSON FeatureCollection)
    #[arg(value_hint = ValueHint::FilePath)]
    pub districts: PathBuf,

    #[command(flatten)]
    pub adjacency: AdjacencyArgs,

    /// Output adjacency list (CSV; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ErgotArgs {
    /// Disease samples (CSV with year, district, incidence, severity)
    #[arg(value_hint = ValueHint::FilePath)]
    pub samples: PathBuf,

    /// District boundaries (GeoJSON); ignored when --neighbors is given
    #[arg(value_hint = ValueHint::FilePath, required_unless_present = "neighbors")]
    pub districts: Option<PathBuf>,

    /// Precomputed adjacency list from `agfeatures neighbors`
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub neighbors: Option<PathBuf>,

    #[command(flatten)]
    pub adjacency: AdjacencyArgs,

    /// Pipeline settings (JSON): filter, lag, bins
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output feature table (CSV; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CalendarArgs {
    /// Dated observations (CSV with date, district and numeric attributes)
    #[arg(value_hint = ValueHint::FilePath)]
    pub observations: PathBuf,

    /// Aggregation settings (JSON): unit, overflow, attributes, stats, years, districts
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Attributes to aggregate; overrides the config file
    #[arg(short, long, value_delimiter = ',')]
    pub attributes: Vec<String>,

    /// Output wide table (CSV; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}
