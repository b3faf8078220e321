//! Regime Classification Tool
//!
//! Histogram-feature classification of a regime definition: stratified
//! k-fold cross-validation on simulated seasons, or fit on simulated and
//! score on real seasons.
//!
//! # Usage
//!
//! ```bash
//! # 5-fold cross-validation of CP07 with 20 bins
//! cargo run --release --bin classify -- --definition CP07
//!
//! # Train on simulated, evaluate on real data
//! cargo run --release --bin classify -- --definition U65 --test data/labeled_real
//!
//! # Sweep histogram bin counts
//! cargo run --release --bin classify -- --definition CP07 --sweep
//!
//! # From a saved run configuration
//! cargo run --release --bin classify -- --config configs/cp07.toml
//!
//! # Write the configuration this invocation would use, then exit
//! cargo run --release --bin classify -- --definition U65 --save-config configs/u65.toml
//! ```
//!
//! Metric records are appended to `--results` as JSON lines.

use clap::{Parser, ValueEnum};
use regime_eval::data::{DataSource, Definition, NpyDataSource};
use regime_eval::evaluation::{best_bins, EvaluationHarness, DEFAULT_BIN_GRID};
use regime_eval::features::{HistogramFeaturizer, HistogramStrategy};
use regime_eval::labeling::{binary_labels, LabelStats};
use regime_eval::model::{ClassifierConfig, ClassifierKind};
use regime_eval::pipeline::Pipeline;
use regime_eval::report::{JsonLinesSink, ScorePlotter, TaskKind, TextBarChart};
use regime_eval::{EvalError, Result, RunConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    RandomForest,
    #[value(alias = "xgboost")]
    GradientBoosting,
}

impl From<ModelArg> for ClassifierKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::RandomForest => ClassifierKind::RandomForest,
            ModelArg::GradientBoosting => ClassifierKind::GradientBoosting,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "classify", about = "Histogram-feature regime classification")]
struct Args {
    /// Run configuration (TOML or JSON); overrides every other option
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved configuration to this path (TOML or JSON) and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Event definition (CP07, U&T, U65, ZPOL_temp)
    #[arg(long, default_value = "CP07")]
    definition: String,

    /// Simulated dataset directory
    #[arg(long, env = "REGIME_TRAIN_DIR", default_value = "data/labeled_simulated")]
    train: PathBuf,

    /// Real dataset directory; switches to cross-dataset evaluation
    #[arg(long, env = "REGIME_TEST_DIR")]
    test: Option<PathBuf>,

    /// Histogram bins per variable
    #[arg(long, default_value_t = 20)]
    bins: usize,

    #[arg(long, value_enum, default_value = "random-forest")]
    model: ModelArg,

    /// Ensemble size
    #[arg(long, default_value_t = 1000)]
    n_estimators: usize,

    /// Stratified folds
    #[arg(long, default_value_t = 5)]
    folds: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print a bar chart of the cross-validated scores
    #[arg(long)]
    plot: bool,

    /// Cross-validate over the default bin grid instead of a single bin count
    #[arg(long)]
    sweep: bool,

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
    let kind = ClassifierKind::from(args.model);
    let mut config = RunConfig::default()
        .with_definition(definition)
        .with_train_path(&args.train)
        .with_bins(args.bins)
        .with_folds(args.folds)
        .with_classifier(ClassifierConfig::for_kind(kind).with_n_estimators(args.n_estimators))
        .with_seed(args.seed)
        .with_results_path(&args.results);
    if let Some(test) = &args.test {
        config = config.with_test_path(test);
    }
    config.evaluation.plot = args.plot;
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;

    if let Some(path) = &args.save_config {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => config.save_json(path)?,
            _ => config.save_toml(path)?,
        }
        log::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let keys = config.variable_keys();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

    let train = NpyDataSource::open(&config.input.train_path)?;
    let raw = train.get_data_for_variables(&key_refs)?;
    let labels = binary_labels(train.get_data_for_variable(config.definition.key())?.view());
    log::info!(
        "Loaded {} seasons x {} variables x {} days, {} labels: {}",
        raw.dim().0,
        raw.dim().1,
        raw.dim().2,
        config.definition,
        LabelStats::from_labels(labels.view())
    );

    let strategy = HistogramStrategy::new(HistogramFeaturizer::new(config.evaluation.n_bins)?, keys.clone());
    let harness = EvaluationHarness::new(
        Pipeline::new(strategy, config.trainer()),
        config.fold_splitter(),
        config.evaluation.metrics.clone(),
        config.record_context(TaskKind::Classification),
    );
    let mut sink = JsonLinesSink::new(&config.output.results_path)?;

    if args.sweep {
        let points = harness.sweep_bins(&DEFAULT_BIN_GRID, raw.view(), labels.view(), &mut sink)?;
        let best = best_bins(&points, 0)
            .ok_or_else(|| EvalError::data("bin sweep produced no finite scores"))?;
        log::info!(
            "Best bin count by {}: {} ({:.4})",
            config.evaluation.metrics[0].display_name(),
            best.n_bins,
            best.means[0]
        );
    } else if let Some(test_path) = &config.input.test_path {
        let test = NpyDataSource::open(test_path)?;
        let raw_test = test.get_data_for_variables(&key_refs)?;
        let labels_test = binary_labels(test.get_data_for_variable(config.definition.key())?.view());
        log::info!("Held-out labels: {}", LabelStats::from_labels(labels_test.view()));
        harness.evaluate_cross_dataset(
            raw.view(),
            labels.view(),
            raw_test.view(),
            labels_test.view(),
            &mut sink,
        )?;
    } else {
        let mut chart = TextBarChart::new(std::io::stdout());
        let plotter: Option<&mut dyn ScorePlotter> = if config.evaluation.plot {
            Some(&mut chart)
        } else {
            None
        };
        harness.evaluate_cross_validated(raw.view(), labels.view(), &mut sink, plotter)?;
    }

    log::info!("Results appended to {}", sink.path().display());
    Ok(())
}
