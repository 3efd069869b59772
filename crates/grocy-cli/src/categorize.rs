//! `categorize` command: fills in missing categories from the keyword table,
//! falling back to a fuzzy vote over the reference source.

use grocy_catalog::{CategorizeSummary, Categorizer, ReferenceIndex};
use grocy_core::AppConfig;
use grocy_db::{PgCatalogStore, RunType};

use crate::{fail_run_best_effort, ledger_count, open_run};

/// Runs one categorize pass and records it in the run ledger.
///
/// # Errors
///
/// Returns an error if the keyword table cannot be loaded, the database is
/// unreachable, or the reference or uncategorized scan fails.
pub(crate) async fn run_categorize(
    config: &AppConfig,
    reference_override: Option<&str>,
) -> anyhow::Result<()> {
    let keywords = grocy_core::load_keyword_table(&config.keywords_path)?;
    if keywords.is_empty() {
        tracing::warn!(
            path = %config.keywords_path.display(),
            "keyword table is empty; only the fuzzy fallback will assign categories"
        );
    }
    let reference = reference_override.unwrap_or(&config.reference_source);

    let pool = crate::connect(config).await?;
    let store = PgCatalogStore::new(pool.clone());
    let run_id = open_run(&pool, RunType::Categorize, None).await?;

    let index = match ReferenceIndex::load(
        &store,
        reference,
        config.fuzzy_limit,
        config.fuzzy_score_cutoff,
    )
    .await
    {
        Ok(index) => index,
        Err(e) => {
            fail_run_best_effort(&pool, run_id, "categorize", format!("{e:#}")).await;
            return Err(e.into());
        }
    };
    if index.is_empty() {
        tracing::warn!(reference, "reference source has no categorized records");
    }
    tracing::info!(reference, records = index.len(), "reference index loaded");

    let categorizer = Categorizer::new(keywords, Box::new(index));
    let summary = match categorizer.categorize_missing(&store).await {
        Ok(summary) => summary,
        Err(e) => {
            fail_run_best_effort(&pool, run_id, "categorize", format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let report = serde_json::json!({
        "reference": reference,
        "scanned": summary.scanned,
        "by_keyword": summary.by_keyword,
        "by_fuzzy": summary.by_fuzzy,
        "unresolved": summary.unresolved,
        "already_assigned": summary.already_assigned,
        "failed": summary.failed,
    });
    if let Err(err) =
        grocy_db::complete_ingest_run(&pool, run_id, ledger_count(summary.scanned), &report).await
    {
        fail_run_best_effort(&pool, run_id, "categorize", format!("{err:#}")).await;
        return Err(err.into());
    }

    println!("{}", describe(&summary));
    Ok(())
}

pub(crate) fn describe(summary: &CategorizeSummary) -> String {
    format!(
        "scanned {}: {} by keyword, {} by fuzzy match, {} unresolved, {} already assigned, {} failed",
        summary.scanned,
        summary.by_keyword,
        summary.by_fuzzy,
        summary.unresolved,
        summary.already_assigned,
        summary.failed,
    )
}
