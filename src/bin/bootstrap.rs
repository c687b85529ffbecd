//! Prepares a `PostgreSQL` database for the task board.
//!
//! Usage:
//!
//! ```text
//! taskboard-bootstrap [--refresh] [--seed] [--pool-size N] [-v]
//! ```
//!
//! The database is chosen from `ENV`, `DB_URL` and `DB_NAME`. The schema
//! script is applied, the raw collections are created when missing, and the
//! catalog views are ensured. With `--refresh`, existing views are
//! recomputed from current data instead. With `--seed`, an empty database
//! also receives demo members, teams and tasks, and the views are refreshed
//! to include them. Any failure exits non-zero.

use clap::Parser;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use taskboard::bootstrap::bootstrap;
use taskboard::config::DatabaseSettings;
use taskboard::seed::{SeedPlan, seed_demo_data};
use taskboard::store::adapters::postgres::PostgresDocumentStore;
use taskboard::view::domain::ViewCatalog;
use taskboard::view::services::{EnsureReport, ViewManager};
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "taskboard-bootstrap", about = "Create task board collections and views")]
struct Cli {
    /// Deployment environment: `dev`, `test` or `prod`.
    #[arg(long, env = "ENV")]
    environment: Option<String>,

    /// `PostgreSQL` server URL without a database path.
    #[arg(long, env = "DB_URL")]
    db_url: Option<String>,

    /// Database name used outside `test` and `prod`.
    #[arg(long, env = "DB_NAME")]
    db_name: Option<String>,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 4)]
    pool_size: u32,

    /// Recompute existing views from current data.
    #[arg(long)]
    refresh: bool,

    /// Fill an empty database with demo data.
    #[arg(long)]
    seed: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let settings = DatabaseSettings::resolve(
        cli.environment.as_deref(),
        cli.db_url.as_deref(),
        cli.db_name.as_deref(),
    )?;
    info!(
        environment = %settings.environment(),
        database = settings.name(),
        "resolved database settings"
    );

    let manager = ConnectionManager::<PgConnection>::new(settings.connection_url());
    let pool = Pool::builder().max_size(cli.pool_size).build(manager)?;
    let store = Arc::new(PostgresDocumentStore::new(pool));
    let catalog = Arc::new(ViewCatalog::standard());

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let report = runtime.block_on(run(store, catalog, &cli))?;
    for (view, outcome) in report.outcomes() {
        info!(view = %view, outcome = outcome.as_str(), "view ready");
    }
    Ok(())
}

async fn run(
    store: Arc<PostgresDocumentStore>,
    catalog: Arc<ViewCatalog>,
    cli: &Cli,
) -> Result<EnsureReport, BoxError> {
    store.apply_schema().await?;
    let manager = ViewManager::new(Arc::clone(&store), Arc::clone(&catalog));
    let report = if cli.refresh {
        manager.refresh_views().await?
    } else {
        bootstrap(Arc::clone(&store), catalog).await?
    };
    if !cli.seed {
        return Ok(report);
    }

    let mut rng = StdRng::from_os_rng();
    let seeded =
        seed_demo_data(store, Arc::new(DefaultClock), &mut rng, SeedPlan::default()).await?;
    match seeded {
        Some(summary) => {
            info!(
                members = summary.members,
                teams = summary.teams,
                tasks = summary.tasks,
                "refreshing views over demo data"
            );
            Ok(manager.refresh_views().await?)
        }
        None => Ok(report),
    }
}

fn setup_logging(verbose: bool) {
    let default_directives = if verbose {
        "taskboard=debug,taskboard_bootstrap=debug"
    } else {
        "taskboard=info,taskboard_bootstrap=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
