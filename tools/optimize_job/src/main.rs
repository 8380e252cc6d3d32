use std::{io::Write, path::PathBuf, sync::Arc};

use clap::{ArgGroup, Parser};
use env_logger::Builder;
use log::info;
use serde::Serialize;

use mr_tuner::{
    cluster::Cluster,
    config::Configuration,
    dataset::{DatasetModel, StaticDataset},
    error::Result,
    optimizer::JobOptimizer,
    oracle::ScalingOracle,
    profile::JobProfile,
    search_strategies::{search_strategy_resolver, DEFAULT_SAMPLES_PER_AXIS},
};

/// Searches the configuration space of a profiled map/reduce job for the
/// settings minimizing its predicted running time.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["conf", "input"])))]
struct Args {
    /// Path to the job profile document.
    #[arg(short, long)]
    profile: PathBuf,

    /// Path to the baseline configuration document.
    #[arg(short, long)]
    conf: Option<PathBuf>,

    /// Path to an input-spec document; requires --cluster.
    #[arg(short, long, requires = "cluster")]
    input: Option<PathBuf>,

    /// Path to a cluster document. Synthesized from `cluster.*`
    /// configuration keys when omitted.
    #[arg(long)]
    cluster: Option<PathBuf>,

    /// Search mode.
    #[arg(short, long, default_value = "smart_rrs")]
    mode: String,

    /// Path for the winning configuration; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path for a JSON search report.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Submission time of the hypothetical run.
    #[arg(long, default_value_t = 0.0)]
    submit_time: f64,

    /// Grid samples per axis for the enumeration modes.
    #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_AXIS)]
    samples: usize,

    /// Number of threads for grid evaluation.
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Seed for the randomized strategies.
    #[arg(long, default_value_t = 123)]
    seed: u64,
}

#[derive(Serialize)]
struct SearchReport {
    mode: String,
    evaluations: usize,
    predicted_duration: f64,
    best_configuration: Configuration,
}

fn run(args: Args) -> Result<()> {
    let profile = JobProfile::from_yaml(&args.profile)?;
    let base_config = match &args.conf {
        Some(path) => Configuration::from_yaml(path)?,
        None => profile.measured_config.clone(),
    };
    let cluster = match &args.cluster {
        Some(path) => Cluster::from_yaml(path)?,
        None => Cluster::from_config(&base_config)?,
    };
    let dataset: Arc<dyn DatasetModel> = match &args.input {
        Some(path) => Arc::new(StaticDataset::from_yaml(path)?),
        None => Arc::new(StaticDataset::from_profile(&profile)),
    };
    info!(
        "optimizing {} with mode {} on {} map / {} reduce slots",
        args.profile.display(),
        args.mode,
        cluster.total_map_slots(),
        cluster.total_reduce_slots()
    );

    let strategy = search_strategy_resolver(&args.mode, args.samples, args.seed)?;
    let oracle = Arc::new(ScalingOracle::new(profile));
    let mut optimizer = JobOptimizer::new(oracle, dataset, cluster, base_config, strategy).with_threads(args.threads);
    let result = optimizer.optimize(args.submit_time)?;

    println!(
        "Predicted duration {:.3}s after {} evaluations",
        result.predicted_duration, result.evaluations
    );
    match &args.output {
        Some(path) => result.best_configuration.save_yaml(path)?,
        None => print!("{}", result.best_configuration.to_yaml()),
    }
    if let Some(path) = &args.report {
        let report = SearchReport {
            mode: args.mode.clone(),
            evaluations: result.evaluations,
            predicted_duration: result.predicted_duration,
            best_configuration: result.best_configuration,
        };
        let text = serde_json::to_string_pretty(&report).expect("report always serializes");
        std::fs::write(path, text)?;
    }
    Ok(())
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
