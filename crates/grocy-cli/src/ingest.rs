//! `ingest` command: one reconciliation task per feed.
//!
//! Feeds run concurrently, bounded by `max_concurrent_feeds`. Records within
//! a feed are reconciled in order. A feed that cannot be read fails its own
//! run row without touching the other feeds. Ctrl-C stops every feed after
//! the record it is working on.

use std::sync::Arc;

use grocy_catalog::{CatalogStore, FeedSummary, MemoryCatalogStore, Reconciler};
use grocy_core::{AppConfig, RawScrapedFields};
use grocy_db::{PgCatalogStore, RunType};
use grocy_scraper::{extractor_for, FeedReader, ScraperError};
use tokio::sync::{watch, Semaphore};

use crate::{fail_run_best_effort, ledger_count, open_run, FeedArg};

/// Where a feed task writes: the database (with a run row) or a shared
/// in-memory catalog for `--dry-run`.
#[derive(Clone)]
enum Target {
    Database(sqlx::PgPool),
    DryRun(Arc<MemoryCatalogStore>),
}

/// Reconciles every feed and prints a per-feed report.
///
/// # Errors
///
/// Returns an error if a feed names an unknown source, the database is
/// unreachable, or every feed failed.
pub(crate) async fn run_ingest(
    config: &AppConfig,
    feeds: Vec<FeedArg>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let readers = feeds
        .into_iter()
        .map(|feed| -> Result<FeedReader, ScraperError> {
            Ok(FeedReader::new(feed.path, extractor_for(&feed.source)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let target = if dry_run {
        Target::DryRun(Arc::new(MemoryCatalogStore::new()))
    } else {
        Target::Database(crate::connect(config).await?)
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping feeds after the current record");
            stop_tx.send_replace(true);
        }
    });

    let permits = Arc::new(Semaphore::new(config.max_concurrent_feeds.max(1)));
    let mut labels = Vec::with_capacity(readers.len());
    let mut handles = Vec::with_capacity(readers.len());
    for reader in readers {
        labels.push(format!("{} ({})", reader.source(), reader.path().display()));
        let target = target.clone();
        let stop = stop_rx.clone();
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            ingest_feed(target, reader, stop).await
        }));
    }

    let results = futures::future::join_all(handles).await;
    ctrl_c.abort();

    let feed_count = results.len();
    let mut failed_feeds: usize = 0;
    for (label, result) in labels.iter().zip(results) {
        match result {
            Ok(Ok(summary)) => println!("{label}: {}", describe(&summary)),
            Ok(Err(e)) => {
                tracing::error!(feed = %label, error = %e, "feed failed");
                println!("{label}: failed: {e:#}");
                failed_feeds += 1;
            }
            Err(e) => {
                tracing::error!(feed = %label, error = %e, "feed task panicked");
                failed_feeds += 1;
            }
        }
    }

    if let Target::DryRun(store) = &target {
        println!("dry-run: catalog holds {} records", store.len()?);
    }

    if failed_feeds > 0 && failed_feeds == feed_count {
        anyhow::bail!("all {failed_feeds} feeds failed");
    }
    Ok(())
}

async fn ingest_feed(
    target: Target,
    reader: FeedReader,
    stop: watch::Receiver<bool>,
) -> anyhow::Result<FeedSummary> {
    let source = reader.source();
    match target {
        Target::DryRun(store) => {
            let records = read_feed(reader).await?;
            Ok(reconcile(store, stop, records).await)
        }
        Target::Database(pool) => {
            let run_id = open_run(&pool, RunType::Ingest, Some(source)).await?;
            let records = match read_feed(reader).await {
                Ok(records) => records,
                Err(e) => {
                    fail_run_best_effort(&pool, run_id, "ingest", format!("{e:#}")).await;
                    return Err(e);
                }
            };

            let store = Arc::new(PgCatalogStore::new(pool.clone()));
            let summary = reconcile(store, stop, records).await;

            let report = serde_json::json!({
                "received": summary.received,
                "inserted": summary.inserted,
                "updated": summary.updated,
                "skipped": summary.skipped,
                "dropped": summary.dropped,
                "failed": summary.failed,
                "cancelled": summary.cancelled,
            });
            if let Err(err) =
                grocy_db::complete_ingest_run(&pool, run_id, ledger_count(summary.received), &report)
                    .await
            {
                fail_run_best_effort(&pool, run_id, "ingest", format!("{err:#}")).await;
                return Err(err.into());
            }
            Ok(summary)
        }
    }
}

/// Reads the whole feed off the async runtime.
async fn read_feed(
    reader: FeedReader,
) -> anyhow::Result<Vec<Result<RawScrapedFields, ScraperError>>> {
    let records = tokio::task::spawn_blocking(move || reader.read_all()).await??;
    Ok(records)
}

async fn reconcile(
    store: Arc<dyn CatalogStore>,
    stop: watch::Receiver<bool>,
    records: Vec<Result<RawScrapedFields, ScraperError>>,
) -> FeedSummary {
    Reconciler::new(store)
        .with_stop_signal(stop)
        .reconcile_feed(records)
        .await
}

pub(crate) fn describe(summary: &FeedSummary) -> String {
    let mut line = format!(
        "received {}, inserted {}, updated {}, skipped {}, dropped {}, failed {}",
        summary.received,
        summary.inserted,
        summary.updated,
        summary.skipped,
        summary.dropped,
        summary.failed,
    );
    if summary.cancelled {
        line.push_str(" (stopped early)");
    }
    line
}
