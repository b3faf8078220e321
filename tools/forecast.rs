//! Regime Forecast Tool
//!
//! Predicts whether a regime event occurs within `interval` days after the
//! first `cutoff` days of a season, from engineered summary features.
//!
//! # Usage
//!
//! ```bash
//! # 5 days in advance after 60 days of input
//! cargo run --release --bin forecast -- --definition CP07
//!
//! # Several intervals reuse one feature cache (data/features60.bin)
//! for i in 5 10 20; do
//!     cargo run --release --bin forecast -- --definition CP07 --interval $i
//! done
//!
//! # Recompute features after changing the engineer
//! cargo run --release --bin forecast -- --definition CP07 --refresh-cache
//! ```

use clap::Parser;
use regime_eval::data::{DataSource, Definition, NpyDataSource};
use regime_eval::features::{EngineeredFeatureStrategy, SummaryFeatureEngineer};
use regime_eval::forecast::{ForecastConfig, ForecastRun, ForecastSplitter};
use regime_eval::model::ClassifierConfig;
use regime_eval::report::{JsonLinesSink, TaskKind};
use regime_eval::{Result, RunConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forecast", about = "Engineered-feature regime forecasting")]
struct Args {
    /// Run configuration (TOML or JSON); overrides every other option
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event definition (CP07, U&T, U65, ZPOL_temp)
    #[arg(long, default_value = "CP07")]
    definition: String,

    /// Dataset directory
    #[arg(long, env = "REGIME_TRAIN_DIR", default_value = "data/labeled_simulated")]
    data: PathBuf,

    /// Days of input per season
    #[arg(long, default_value_t = 60)]
    cutoff: usize,

    /// Days after the cutoff searched for an event
    #[arg(long, default_value_t = 5)]
    interval: usize,

    /// Directory of the feature cache
    #[arg(long, env = "REGIME_CACHE_DIR", default_value = "data")]
    cache_dir: PathBuf,

    /// Disable the feature cache
    #[arg(long, conflicts_with = "refresh_cache")]
    no_cache: bool,

    /// Delete the cached features for this cutoff before running
    #[arg(long)]
    refresh_cache: bool,

    /// Boosting rounds
    #[arg(long, default_value_t = 100)]
    n_estimators: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON-lines file receiving metric records
    #[arg(long, default_value = "output/results.jsonl")]
    results: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn resolve_config(args: &Args) -> Result<RunConfig> {
    if let Some(path) = &args.config {
        return match path.extension().and_then(|e| e.to_str()) {
            Some("json") => RunConfig::load_json(path),
            _ => RunConfig::load_toml(path),
        };
    }

    let definition: Definition = args.definition.parse()?;
    let mut forecast = ForecastConfig {
        cutoff_point: args.cutoff,
        prediction_interval: args.interval,
        ..ForecastConfig::default()
    };
    if !args.no_cache {
        forecast = forecast.with_cache_dir(&args.cache_dir);
    }

    let config = RunConfig::default()
        .with_definition(definition)
        .with_train_path(&args.data)
        .with_classifier(ClassifierConfig::gradient_boosting().with_n_estimators(args.n_estimators))
        .with_forecast(forecast)
        .with_seed(args.seed)
        .with_results_path(&args.results);
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let forecast = config.forecast.clone().unwrap_or_default();

    let keys = config.variable_keys();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let source = NpyDataSource::open(&config.input.train_path)?;
    let raw = source.get_data_for_variables(&key_refs)?;
    let raw_labels = source.get_data_for_variable(config.definition.key())?;

    let strategy = EngineeredFeatureStrategy::new(SummaryFeatureEngineer::default(), keys);
    let splitter = ForecastSplitter::new(strategy, forecast)?;
    if args.refresh_cache {
        if let Some(cache) = splitter.cache() {
            if cache.invalidate()? {
                log::info!("Removed cached features {}", cache.path().display());
            }
        }
    }

    let run = ForecastRun::new(
        splitter,
        config.trainer(),
        config.record_context(TaskKind::Prediction),
    );
    let mut sink = JsonLinesSink::new(&config.output.results_path)?;
    let outcome = run.run(raw.view(), raw_labels.view(), &mut sink)?;

    log::info!(
        "Done (features {}), results appended to {}",
        if outcome.cache_hit { "from cache" } else { "computed" },
        sink.path().display()
    );
    Ok(())
}
