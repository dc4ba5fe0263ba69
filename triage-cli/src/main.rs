use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, Level};

use triage_core::aggregates::RandomDeltas;
use triage_core::{
    auto_refresh_loop, classify, AggregateSnapshot, AggregationEngine, AnnotationSubmitter,
    Fixture, InMemorySubmitter, PerturbationSource, RefreshCoordinator, RefreshRequest,
    ReviewController,
};

mod config;
mod render;
mod session;

use config::Config;
use session::Session;

/// Triage: review model-predicted document labels
#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(about = "Review model-predicted document labels", long_about = None)]
struct Cli {
    /// JSON fixture with documents and categories (overrides TRIAGE_FIXTURE_PATH)
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Seed for simulated aggregate refreshes (overrides TRIAGE_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Simulated refresh latency in milliseconds (overrides TRIAGE_REFRESH_LATENCY_MS)
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive review session on stdin
    Review,
    /// Print the summary view
    Dashboard(DashboardArgs),
    /// Print the confidence tier of a score
    Classify(ClassifyArgs),
}

#[derive(Parser, Debug)]
struct DashboardArgs {
    /// Number of refreshes to run before printing
    #[arg(long, default_value_t = 0)]
    refreshes: u32,
}

#[derive(Parser, Debug)]
struct ClassifyArgs {
    /// Confidence score in [0, 1]
    score: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.fixture {
        config.fixture_path = Some(path);
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(ms) = cli.latency_ms {
        config.refresh_latency = Duration::from_millis(ms);
    }

    match cli.command {
        Commands::Review => run_review(&config).await,
        Commands::Dashboard(args) => run_dashboard(&config, args).await,
        Commands::Classify(args) => {
            let tier = classify(args.score);
            println!("{} ({})", tier, tier.badge());
            Ok(())
        }
    }
}

fn load_fixture(config: &Config) -> Result<Fixture> {
    match &config.fixture_path {
        Some(path) => {
            info!("Loading fixture from {}", path.display());
            Fixture::from_path(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))
        }
        None => Ok(Fixture::builtin()),
    }
}

fn build_engine(config: &Config) -> Arc<AggregationEngine> {
    let rng = match config.seed {
        Some(seed) => {
            info!("Seeding aggregate refreshes with {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let source = PerturbationSource::new(AggregateSnapshot::baseline(), RandomDeltas(rng))
        .with_latency(config.refresh_latency);
    Arc::new(AggregationEngine::new(
        AggregateSnapshot::baseline(),
        Arc::new(source),
    ))
}

fn build_submitter(config: &Config) -> Arc<dyn AnnotationSubmitter> {
    if config.fail_submissions {
        info!("Submission endpoint will reject every batch");
        Arc::new(InMemorySubmitter::rejecting("submissions disabled by configuration"))
    } else {
        Arc::new(InMemorySubmitter::new())
    }
}

async fn run_review(config: &Config) -> Result<()> {
    let fixture = load_fixture(config)?;
    info!(
        "Loaded {} document(s), {} categories",
        fixture.documents.len(),
        fixture.categories.len()
    );

    let controller = ReviewController::new(fixture, build_submitter(config));
    let coordinator = RefreshCoordinator::new(build_engine(config));

    let auto_refresh = config.auto_refresh.map(|period| {
        info!("Refreshing the summary every {:?}", period);
        tokio::spawn(auto_refresh_loop(coordinator.clone(), period))
    });

    let result = Session::new(controller, coordinator)
        .run(BufReader::new(tokio::io::stdin()))
        .await;

    if let Some(task) = auto_refresh {
        task.abort();
    }
    result
}

async fn run_dashboard(config: &Config, args: DashboardArgs) -> Result<()> {
    let fixture = load_fixture(config)?;
    let controller = ReviewController::new(fixture, build_submitter(config));
    let coordinator = RefreshCoordinator::new(build_engine(config));

    for _ in 0..args.refreshes {
        match coordinator.request_refresh() {
            RefreshRequest::Started(handle) => {
                let outcome = handle.wait().await;
                println!("{}", render::refresh_outcome(&outcome));
            }
            RefreshRequest::AlreadyInProgress => {
                println!("A refresh is already in progress.");
            }
        }
    }

    let snapshot = coordinator.engine().snapshot().await;
    println!(
        "{}",
        render::dashboard(&snapshot, controller.average_confidence_percent())
    );
    Ok(())
}
