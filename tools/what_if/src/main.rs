use std::{io::Write, path::PathBuf, sync::Arc};

use clap::{ArgGroup, Parser};
use env_logger::Builder;

use mr_tuner::{
    cluster::Cluster,
    config::Configuration,
    dataset::{DatasetModel, StaticDataset},
    error::{Result, TunerError},
    execution::JobExecution,
    oracle::ScalingOracle,
    profile::JobProfile,
    simulator::TaskScheduler,
    whatif::WhatIfEngine,
};

/// Answers single-configuration what-if questions about a profiled
/// map/reduce job, without searching.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["conf", "input"])))]
struct Args {
    /// Path to the job profile document.
    #[arg(short, long)]
    profile: PathBuf,

    /// Path to the configuration document to ask about.
    #[arg(short, long)]
    conf: Option<PathBuf>,

    /// Path to an input-spec document; requires --cluster.
    #[arg(short, long, requires = "cluster")]
    input: Option<PathBuf>,

    /// Path to a cluster document. Synthesized from `cluster.*`
    /// configuration keys when omitted.
    #[arg(long)]
    cluster: Option<PathBuf>,

    /// Question to answer: time, profile, timeline, mappers or reducers.
    #[arg(short, long, default_value = "time")]
    question: String,

    /// Path for the timeline JSON; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Submission time of the hypothetical run.
    #[arg(long, default_value_t = 0.0)]
    submit_time: f64,
}

fn print_task_table(execution: &JobExecution, reducers: bool) {
    let tasks = if reducers {
        &execution.reduce_tasks
    } else {
        &execution.map_tasks
    };
    let width = tasks
        .iter()
        .map(|t| t.attempt.host.len())
        .max()
        .unwrap_or(0)
        .max("host".len());
    if reducers {
        println!(
            "| {: >4} | {: <width$} | {: >10} | {: >11} | {: >10} | {: >10} | {: >10} |",
            "task",
            "host",
            "start",
            "shuffle end",
            "sort end",
            "end",
            "duration",
            width = width
        );
        for (task, t) in tasks.iter().enumerate() {
            println!(
                "| {: >4} | {: <width$} | {: >10.3} | {: >11.3} | {: >10.3} | {: >10.3} | {: >10.3} |",
                task,
                t.attempt.host,
                t.attempt.start_time,
                t.attempt.shuffle_end_time.unwrap_or(t.attempt.start_time),
                t.attempt.sort_end_time.unwrap_or(t.attempt.start_time),
                t.attempt.end_time,
                t.attempt.end_time - t.attempt.start_time,
                width = width
            );
        }
    } else {
        println!(
            "| {: >4} | {: <width$} | {: >10} | {: >10} | {: >10} |",
            "task",
            "host",
            "start",
            "end",
            "duration",
            width = width
        );
        for (task, t) in tasks.iter().enumerate() {
            println!(
                "| {: >4} | {: <width$} | {: >10.3} | {: >10.3} | {: >10.3} |",
                task,
                t.attempt.host,
                t.attempt.start_time,
                t.attempt.end_time,
                t.attempt.end_time - t.attempt.start_time,
                width = width
            );
        }
    }
}

fn run(args: Args) -> Result<()> {
    let profile = JobProfile::from_yaml(&args.profile)?;
    let config = match &args.conf {
        Some(path) => Configuration::from_yaml(path)?,
        None => profile.measured_config.clone(),
    };
    let cluster = match &args.cluster {
        Some(path) => Cluster::from_yaml(path)?,
        None => Cluster::from_config(&config)?,
    };
    let dataset: Arc<dyn DatasetModel> = match &args.input {
        Some(path) => Arc::new(StaticDataset::from_yaml(path)?),
        None => Arc::new(StaticDataset::from_profile(&profile)),
    };
    let oracle = Arc::new(ScalingOracle::new(profile));
    let scheduler = TaskScheduler::new(&cluster);
    let mut engine = WhatIfEngine::new(oracle, dataset, scheduler);

    match args.question.as_str() {
        "time" => {
            let duration = engine.predict_duration(&config, args.submit_time, false)?;
            println!("Predicted duration {:.3}s", duration);
        }
        "profile" => {
            let projected = engine.predict_profile(&config)?;
            print!("{}", projected.to_yaml()?);
        }
        "timeline" => {
            let execution = engine.predict_execution(&config, args.submit_time)?;
            match &args.output {
                Some(path) => execution.save_json(path)?,
                None => println!("{}", execution.to_json()),
            }
        }
        "mappers" => {
            let execution = engine.predict_execution(&config, args.submit_time)?;
            print_task_table(&execution, false);
        }
        "reducers" => {
            let execution = engine.predict_execution(&config, args.submit_time)?;
            print_task_table(&execution, true);
        }
        other => {
            return Err(TunerError::InvalidValue {
                key: "question".to_string(),
                value: other.to_string(),
            })
        }
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
