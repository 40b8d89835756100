use bevy::log::tracing;
use bevy::log::tracing_subscriber::{self, EnvFilter};
use clap::Parser;

use bhtree::cli::{self, Args};

fn init_logging(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let default_directive = if verbose { "bhtree=debug" } else { "bhtree=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = cli::load_and_apply_config(&args)?;
    let history = cli::run(&config)?;

    if let Some(last) = history.last() {
        println!(
            "{} bodies, {} cells, max depth {}, cube edge {} at origin {}",
            last.particle_count, last.cell_count, last.max_depth, last.edge, last.origin
        );
    }

    Ok(())
}
