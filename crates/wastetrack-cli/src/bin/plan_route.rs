//! Plan a collection route for a container file or a random layout.
//!
//! Prints the accepted route as a JSON simulation record on stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wastetrack_cli::{load_containers, random_containers, SimulationRecord};
use wastetrack_core::{PlannerConfig, RoutePlanner, DEFAULT_MINUTES_PER_KM};
use wastetrack_solver::{ExternalSolver, SolverConfig};

/// Waste collection route planner
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file with container records
    #[arg(long, conflicts_with = "random")]
    input: Option<PathBuf>,

    /// Generate this many random containers instead of reading a file
    #[arg(long)]
    random: Option<usize>,

    /// Seed for random generation (default: from entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Center latitude for random containers (default: Santiago, CL)
    #[arg(long, default_value_t = -33.4489, allow_negative_numbers = true)]
    center_lat: f64,

    /// Center longitude for random containers (default: Santiago, CL)
    #[arg(long, default_value_t = -70.6693, allow_negative_numbers = true)]
    center_lon: f64,

    /// Radius in km for random containers
    #[arg(long, default_value_t = 3.0)]
    radius_km: f64,

    /// Ask the external solver first (needs WASTETRACK_SOLVER_API_KEY or OPENAI_API_KEY)
    #[arg(long)]
    use_solver: bool,

    /// Travel time assumption for the duration estimate
    #[arg(long, default_value_t = DEFAULT_MINUTES_PER_KM)]
    minutes_per_km: f64,

    /// Overall limit for one solver attempt, in seconds
    #[arg(long, default_value_t = 30)]
    solver_timeout_secs: u64,

    /// Solver attempts before falling back to the greedy route
    #[arg(long, default_value_t = 1)]
    solver_attempts: u32,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("wastetrack_core=info".parse()?)
            .add_directive("wastetrack_solver=info".parse()?))
        .init();

    let args = Args::parse();

    let records = match (&args.input, args.random) {
        (Some(path), _) => load_containers(path)?,
        (None, Some(count)) => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            tracing::info!(
                "Generating {} random containers within {} km of ({}, {})",
                count, args.radius_km, args.center_lat, args.center_lon
            );
            random_containers(&mut rng, count, (args.center_lat, args.center_lon), args.radius_km)
        }
        (None, None) => bail!("Provide --input <FILE> or --random <COUNT>"),
    };
    let container_count = records.len();

    let config = PlannerConfig {
        minutes_per_km: args.minutes_per_km,
        solver_timeout: Duration::from_secs(args.solver_timeout_secs),
        solver_attempts: args.solver_attempts.max(1),
    };
    let planner = RoutePlanner::new(config);

    let outcome = if args.use_solver {
        let solver_config = SolverConfig::from_env();
        if solver_config.is_configured() {
            tracing::info!("Using external solver model {}", solver_config.model);
            let solver = ExternalSolver::from_config(&solver_config)?;
            planner.with_external(solver).plan(records).await
        } else {
            tracing::warn!("--use-solver given but no solver API key is set; using greedy route");
            planner.plan(records).await
        }
    } else {
        planner.plan(records).await
    }
    .context("Route planning failed")?;

    tracing::info!(
        "Planned {} stops, {:.2} km, ~{:.0} min ({:?})",
        outcome.summary.route.len(),
        outcome.summary.total_distance_km,
        outcome.summary.estimated_duration_min,
        outcome.source
    );

    let record = SimulationRecord::new(container_count, outcome);
    let json = if args.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");

    Ok(())
}
