//! census-load entry point.
//!
//! Downloads census tables from the Nomis API into a local SQLite database.
//! Every response is cached on disk, so an interrupted run can be repeated
//! without hitting the network again. Logging goes to stderr.

use anyhow::{Context, Result};
use census_client::{CachedSource, FetchClient, FetchConfig, NomisApi, PageSource, Pipeline};
use census_core::{AppConfig, CensusDb, YearProfile};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load census tables into SQLite", long_about = None)]
struct Args {
    /// Only load the profile for this census year (repeatable).
    #[arg(long = "year", value_name = "YEAR")]
    years: Vec<i32>,

    /// Print the datasets each profile would load, then exit.
    #[arg(long)]
    list: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn list<S: PageSource>(api: &NomisApi<S>, profiles: &[&YearProfile]) -> Result<()> {
    let catalog = api.catalog().await.context("loading dataset catalog")?;
    for profile in profiles {
        let selected = catalog.select(profile);
        println!("{} ({} datasets)", profile.year, selected.len());
        for dataset in selected {
            println!("  {}\t{}\t{}", dataset.table_id, dataset.table_name, dataset.dimensions.join(","));
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = AppConfig::load().context("loading configuration")?;
    let profiles = config.profiles_for(&args.years);
    if profiles.is_empty() {
        anyhow::bail!("no profile configured for years {:?}", args.years);
    }

    let client = FetchClient::new(FetchConfig::from(&config))?;
    let source = CachedSource::new(client, &config.cache_db_path);
    let api = NomisApi::new(source, &config.base_url)?;

    if args.list {
        return list(&api, &profiles).await;
    }

    let uid = config.require_uid()?;

    tracing::info!(
        cache = %config.cache_db_path.display(),
        store = %config.census_db_path.display(),
        profiles = profiles.len(),
        "starting census load"
    );

    let store = CensusDb::open(&config.census_db_path)
        .await
        .with_context(|| format!("opening {}", config.census_db_path.display()))?;
    let catalog = api.catalog().await.context("loading dataset catalog")?;
    tracing::info!(datasets = catalog.len(), "catalog loaded");

    let pipeline = Pipeline::new(api, store, uid, config.record_limit)?;
    let summary = pipeline.run(&catalog, &profiles).await?;

    tracing::info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        rows_received = summary.rows.rows_received,
        rows_inserted = summary.rows.rows_inserted,
        "census load finished"
    );

    Ok(())
}
