//! Command line interface for the bhtree driver

use std::fmt;
use std::path::Path;

use bevy::log::info;
use clap::Parser;

use crate::config::{BhTreeConfig, BuildStrategy};
use crate::generation::{self, SharedRng};
use crate::physics::octree::{Octree, OctreeError, OctreeStats, Particle};

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded
    ConfigLoad(String),
    /// Tree construction failed
    Build(OctreeError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
            CliError::Build(e) => write!(f, "Failed to build octree: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<OctreeError> for CliError {
    fn from(e: OctreeError) -> Self {
        CliError::Build(e)
    }
}

/// bhtree - Barnes-Hut octree construction driver
#[derive(Parser, Debug, Default)]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"),
    about,
    long_about = None
)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Number of bodies to generate (overrides config file)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub bodies: Option<usize>,

    /// Random seed for body generation
    #[arg(short = 's', long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Number of timesteps to rebuild the tree for
    #[arg(long, value_name = "COUNT")]
    pub steps: Option<usize>,

    /// Insert into top-level octants concurrently
    #[arg(short = 'p', long)]
    pub parallel: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<BhTreeConfig, CliError> {
    let mut config = if let Some(config_path) = &args.config {
        if !Path::new(config_path).exists() {
            return Err(CliError::ConfigLoad(format!("{config_path} does not exist")));
        }
        info!("Loading configuration from: {config_path}");
        BhTreeConfig::load_or_default(config_path)
    } else {
        BhTreeConfig::load_from_user_config()
    };

    if let Some(body_count) = args.bodies {
        info!("Overriding body count to: {body_count}");
        config.generation.body_count = body_count;
    }

    if let Some(seed) = args.seed {
        info!("Using random seed: {seed}");
        config.generation.seed = Some(seed);
    }

    if let Some(steps) = args.steps {
        config.generation.steps = steps;
    }

    if args.parallel {
        config.build.strategy = BuildStrategy::Parallel;
    }

    Ok(config)
}

/// Generate a body set and rebuild the tree once per timestep, drifting the
/// bodies in between. The tree is reused so each step starts from the cube
/// grown by the previous one.
pub fn run(config: &BhTreeConfig) -> Result<Vec<OctreeStats>, CliError> {
    let mut rng = SharedRng::from_optional_seed(config.generation.seed);
    let bodies = generation::plummer_bodies(config.generation.body_count, &mut rng);
    let (history, _) = simulate(config, bodies)?;
    Ok(history)
}

/// Step `bodies` through the configured number of timesteps and hand them
/// back in the order they were given, so `next` links stay valid.
pub fn simulate(
    config: &BhTreeConfig,
    mut bodies: Vec<Particle>,
) -> Result<(Vec<OctreeStats>, Vec<Particle>), CliError> {
    let settings = &config.generation;
    let mut tree = Octree::from_config(&config.tree).with_capacity(bodies.len());
    let mut history = Vec::with_capacity(settings.steps);

    for step in 0..settings.steps {
        tree.build_with(
            config.build.strategy,
            config.build.parallel_threshold,
            bodies.clone(),
        )?;

        let stats = tree.stats();
        info!(
            "Step {step}: {} bodies in {} cells, depth {}, edge {}",
            stats.particle_count, stats.cell_count, stats.max_depth, stats.edge
        );
        history.push(stats);

        generation::drift(&mut bodies, settings.time_step);
    }

    Ok((history, bodies))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(strategy: BuildStrategy) -> BhTreeConfig {
        let mut config = BhTreeConfig::default();
        config.generation.body_count = 300;
        config.generation.seed = Some(12);
        config.generation.steps = 4;
        config.build.strategy = strategy;
        config.build.parallel_threshold = 0;
        config
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::try_parse_from(["bhtree", "-n", "64", "-s", "5", "--steps", "2", "-p"]).unwrap();

        assert_eq!(args.bodies, Some(64));
        assert_eq!(args.seed, Some(5));
        assert_eq!(args.steps, Some(2));
        assert!(args.parallel);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args {
            config: Some("/nonexistent/bhtree.toml".to_string()),
            ..Default::default()
        };

        assert!(matches!(load_and_apply_config(&args), Err(CliError::ConfigLoad(_))));
    }

    #[test]
    fn test_run_keeps_every_body_each_step() {
        let history = run(&small_config(BuildStrategy::Sequential)).unwrap();

        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|stats| stats.particle_count == 300));
        assert!(history.windows(2).all(|pair| pair[1].edge >= pair[0].edge));
    }

    #[test]
    fn test_run_strategies_agree() {
        let sequential = run(&small_config(BuildStrategy::Sequential)).unwrap();
        let parallel = run(&small_config(BuildStrategy::Parallel)).unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_simulate_keeps_body_order_and_links() {
        let config = small_config(BuildStrategy::Sequential);
        let mut rng = SharedRng::from_seed(3);
        let initial = generation::plummer_bodies(50, &mut rng);

        let (history, bodies) = simulate(&config, initial.clone()).unwrap();

        assert_eq!(history.len(), 4);
        assert_eq!(bodies.len(), initial.len());
        for (index, (body, start)) in bodies.iter().zip(&initial).enumerate() {
            assert_eq!(body.next, (index + 1 < initial.len()).then_some(index + 1));
            let expected = start.position + start.velocity * 4.0 * config.generation.time_step;
            assert!(body.position.abs_diff_eq(expected, 1e-12));
        }
    }
}
