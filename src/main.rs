use anyhow::Result;
use clap::Parser;

use agfeatures::cli::{Cli, Commands};
use agfeatures::commands::{calendar, ergot, neighbors};

fn main() -> Result<()> {
    let cli = Cli::parse();
    pretty_env_logger::formatted_builder()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Neighbors(args) => neighbors::run(&cli, args),
        Commands::Ergot(args) => ergot::run(&cli, args),
        Commands::Calendar(args) => calendar::run(&cli, args),
    }
}
