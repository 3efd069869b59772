use super::*;
use grocy_catalog::{CategorizeSummary, FeedSummary};

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["grocy-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["grocy-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["grocy-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_repeated_feeds() {
    let cli = Cli::try_parse_from([
        "grocy-cli",
        "ingest",
        "--feed",
        "Rimi=data/rimi.jsonl",
        "--feed",
        "Maxima=data/maxima.jsonl",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Ingest { feeds, dry_run }) = cli.command else {
        panic!("expected ingest command");
    };
    assert!(!dry_run);
    assert_eq!(
        feeds,
        vec![
            FeedArg {
                source: "Rimi".to_string(),
                path: PathBuf::from("data/rimi.jsonl"),
            },
            FeedArg {
                source: "Maxima".to_string(),
                path: PathBuf::from("data/maxima.jsonl"),
            },
        ]
    );
}

#[test]
fn ingest_dry_run_flag() {
    let cli = Cli::try_parse_from(["grocy-cli", "ingest", "--feed", "Rimi=a.jsonl", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest { dry_run: true, .. })
    ));
}

#[test]
fn ingest_requires_a_feed() {
    assert!(Cli::try_parse_from(["grocy-cli", "ingest"]).is_err());
}

#[test]
fn feed_without_separator_is_rejected() {
    assert!(Cli::try_parse_from(["grocy-cli", "ingest", "--feed", "rimi.jsonl"]).is_err());
    assert!(parse_feed_arg("=rimi.jsonl").is_err());
    assert!(parse_feed_arg("Rimi=").is_err());
}

#[test]
fn feed_path_may_contain_equals() {
    let feed = parse_feed_arg("Rimi=out/run=3.jsonl").expect("valid feed arg");
    assert_eq!(feed.source, "Rimi");
    assert_eq!(feed.path, PathBuf::from("out/run=3.jsonl"));
}

#[test]
fn parses_categorize_with_reference_override() {
    let cli = Cli::try_parse_from(["grocy-cli", "categorize", "--reference", "Maxima"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Categorize { reference }) => {
            assert_eq!(reference.as_deref(), Some("Maxima"));
        }
        other => panic!("expected categorize command, got {other:?}"),
    }

    let cli = Cli::try_parse_from(["grocy-cli", "categorize"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Categorize { reference: None })
    ));
}

#[test]
fn ledger_count_saturates() {
    assert_eq!(ledger_count(12), 12);
    assert_eq!(ledger_count(usize::MAX), i32::MAX);
}

#[test]
fn feed_report_marks_stopped_feeds() {
    let summary = FeedSummary {
        received: 3,
        inserted: 1,
        updated: 1,
        skipped: 1,
        cancelled: true,
        ..FeedSummary::default()
    };
    assert_eq!(
        ingest::describe(&summary),
        "received 3, inserted 1, updated 1, skipped 1, dropped 0, failed 0 (stopped early)"
    );
}

#[test]
fn categorize_report_lists_every_counter() {
    let summary = CategorizeSummary {
        scanned: 4,
        by_keyword: 2,
        by_fuzzy: 1,
        unresolved: 1,
        ..CategorizeSummary::default()
    };
    assert_eq!(
        categorize::describe(&summary),
        "scanned 4: 2 by keyword, 1 by fuzzy match, 1 unresolved, 0 already assigned, 0 failed"
    );
}

fn offline_config() -> grocy_core::AppConfig {
    grocy_core::AppConfig {
        database_url: None,
        log_level: "info".to_string(),
        keywords_path: PathBuf::from("./config/keywords.txt"),
        reference_source: "Rimi".to_string(),
        fuzzy_limit: 10,
        fuzzy_score_cutoff: 30.0,
        max_concurrent_feeds: 2,
        db_max_connections: 10,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
    }
}

#[tokio::test]
async fn dry_run_ingest_works_without_database_url() {
    let path = std::env::temp_dir().join(format!(
        "grocy-cli-dry-run-{}.jsonl",
        std::process::id()
    ));
    std::fs::write(
        &path,
        "{\"product_code\":\"A\",\"name\":\"Piens 1 l\",\"price_euros\":\"1\",\"price_cents\":\"29\"}\n",
    )
    .expect("write temp feed");
    let feeds = vec![FeedArg {
        source: "Rimi".to_string(),
        path: path.clone(),
    }];

    let result = ingest::run_ingest(&offline_config(), feeds, true).await;
    std::fs::remove_file(&path).ok();
    assert!(result.is_ok(), "got {result:?}");
}

#[tokio::test]
async fn database_commands_report_missing_url() {
    let err = connect(&offline_config())
        .await
        .expect_err("no url configured");
    assert!(err.to_string().contains("DATABASE_URL"), "got {err}");
}
