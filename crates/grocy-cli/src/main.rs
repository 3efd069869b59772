mod categorize;
mod ingest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grocy-cli")]
#[command(about = "Grocery catalog reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Reconcile scraped feeds into the catalog
    Ingest {
        /// A feed as `<source>=<path>`; repeat for several feeds
        #[arg(long = "feed", required = true, value_parser = parse_feed_arg)]
        feeds: Vec<FeedArg>,

        /// Reconcile against an in-memory catalog instead of the database;
        /// `DATABASE_URL` is not needed
        #[arg(long)]
        dry_run: bool,
    },
    /// Assign categories to uncategorized records
    Categorize {
        /// Source whose categorized records vote in the fuzzy fallback
        #[arg(long)]
        reference: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

/// One `--feed <source>=<path>` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeedArg {
    pub source: String,
    pub path: PathBuf,
}

fn parse_feed_arg(raw: &str) -> Result<FeedArg, String> {
    let (source, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <source>=<path>, got '{raw}'"))?;
    let source = source.trim();
    let path = path.trim();
    if source.is_empty() || path.is_empty() {
        return Err(format!("expected <source>=<path>, got '{raw}'"));
    }
    Ok(FeedArg {
        source: source.to_string(),
        path: PathBuf::from(path),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("grocy-cli: no command given, see --help");
        return Ok(());
    };

    let config = grocy_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    grocy_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = grocy_db::run_migrations(&pool).await?;
                    println!("applied {applied} migrations");
                }
            }
        }
        Commands::Ingest { feeds, dry_run } => {
            ingest::run_ingest(&config, feeds, dry_run).await?;
        }
        Commands::Categorize { reference } => {
            categorize::run_categorize(&config, reference.as_deref()).await?;
        }
    }

    Ok(())
}

async fn connect(config: &grocy_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = grocy_db::PoolConfig::from_app_config(config);
    let pool = grocy_db::connect_pool(config.require_database_url()?, pool_config).await?;
    Ok(pool)
}

/// Creates a run row and moves it to `running`.
async fn open_run(
    pool: &sqlx::PgPool,
    run_type: grocy_db::RunType,
    source: Option<&str>,
) -> anyhow::Result<i64> {
    let run = grocy_db::create_ingest_run(pool, run_type, source, "cli").await?;
    if let Err(e) = grocy_db::start_ingest_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, run_type.as_str(), format!("{e:#}")).await;
        return Err(e.into());
    }
    Ok(run.id)
}

/// Attempt to mark a run as failed, logging any secondary error.
async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    context: &'static str,
    message: String,
) {
    if let Err(mark_err) = grocy_db::fail_ingest_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark {context} run as failed"
        );
    }
}

/// Clamps a counter into the ledger's `INT` column.
fn ledger_count(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests;
