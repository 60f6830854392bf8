mod analysis;
mod common;
mod config;
mod discovery;
mod parsing;

use argh::FromArgs;
use env_logger::Env;
use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

use analysis::{
    format_registry, generate_coldstart_report, generate_dapo_report, generate_figures,
    generate_scalability, generate_stepwise_overlay,
};
use analysis::constants::ROUNDS_JOURNAL;

/// Plots and summaries for RL experiments on GUI grounding models
#[derive(FromArgs, Debug)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Coldstart(ColdstartArgs),
    Dapo(DapoArgs),
    StepwiseOverlay(StepwiseOverlayArgs),
    Scalability(ScalabilityArgs),
    Figures(FiguresArgs),
}

/// scan cold-start experiments and plot scaling, budgets and ablations
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "coldstart")]
struct ColdstartArgs {
    /// results root (default: $RL_RESULTS_ROOT or rl_eval_results)
    #[argh(option, short = 'r')]
    results_root: Option<PathBuf>,

    /// output directory (default: $JOURNAL_ASSETS_DIR or journal/data)
    #[argh(option, short = 'o')]
    assets_dir: Option<PathBuf>,
}

/// plot DAPO training-log tables per benchmark and per model
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "dapo")]
struct DapoArgs {
    /// markdown training log to read
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// output directory (default: $JOURNAL_ASSETS_DIR or journal/data)
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// overlay per-step accuracy of the initial and improved RL pipelines
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "stepwise-overlay")]
struct StepwiseOverlayArgs {
    /// results root (default: $RL_RESULTS_ROOT or rl_eval_results)
    #[argh(option, short = 'r')]
    results_root: Option<PathBuf>,

    /// glob selecting the initial pipeline run
    #[argh(option)]
    old_glob: Option<String>,

    /// glob selecting the improved pipeline run
    #[argh(option)]
    new_glob: Option<String>,

    /// per-step CSV of the initial pipeline
    #[argh(option)]
    old_csv: Option<PathBuf>,

    /// output directory (default: $JOURNAL_ASSETS_DIR or journal/data)
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// plot accuracy across RL rounds next to the 63k step-wise curve
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "scalability")]
struct ScalabilityArgs {
    /// results root (default: $RL_RESULTS_ROOT or rl_eval_results)
    #[argh(option, short = 'r')]
    results_root: Option<PathBuf>,

    /// journal entry with the per-round results table
    #[argh(option, short = 'j')]
    journal: Option<PathBuf>,

    /// output directory (default: $JOURNAL_ASSETS_DIR or journal/data)
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// render the hard-coded journal figures
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "figures")]
struct FiguresArgs {
    /// render only the named figure
    #[argh(option, short = 'n')]
    name: Option<String>,

    /// list the available figures and exit
    #[argh(switch, short = 'l')]
    list: bool,

    /// output directory (default: $JOURNAL_ASSETS_DIR or journal/data)
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// Errors that can occur while generating reports
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cold-start report error: {0}")]
    Coldstart(#[from] analysis::coldstart::ColdstartError),

    #[error("DAPO report error: {0}")]
    Dapo(#[from] analysis::dapo::DapoError),

    #[error("Pipeline report error: {0}")]
    Pipeline(#[from] analysis::pipeline::PipelineError),

    #[error("Figure error: {0}")]
    Figure(#[from] analysis::figures::FigureError),
}

type Result<T> = core::result::Result<T, AnalysisError>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    match args.command {
        Command::Coldstart(args) => run_coldstart(args),
        Command::Dapo(args) => run_dapo(args),
        Command::StepwiseOverlay(args) => run_stepwise_overlay(args),
        Command::Scalability(args) => run_scalability(args),
        Command::Figures(args) => run_figures(args),
    }
}

fn report_outputs(outputs: &[PathBuf]) {
    for path in outputs {
        info!("Wrote {}", path.display());
    }
}

/// Results root used for fallbacks; a missing root only warns
fn optional_results_root(flag: Option<PathBuf>) -> PathBuf {
    let root = config::results_root(flag);
    if let Err(err) = config::require_dir(&root) {
        warn!("{err}; falling back to journal values");
    }
    root
}

fn run_coldstart(args: ColdstartArgs) -> Result<()> {
    let results_root = config::results_root(args.results_root);
    config::require_dir(&results_root)?;
    let assets_dir = config::assets_dir(args.assets_dir);

    info!("Results root: {}", results_root.display());
    info!("Output directory: {}", assets_dir.display());

    let outputs = generate_coldstart_report(&results_root, &assets_dir)?;
    report_outputs(&outputs);
    Ok(())
}

fn run_dapo(args: DapoArgs) -> Result<()> {
    let output_dir = config::assets_dir(args.output_dir);
    let outputs = generate_dapo_report(&args.input, &output_dir)?;
    report_outputs(&outputs);
    Ok(())
}

fn run_stepwise_overlay(args: StepwiseOverlayArgs) -> Result<()> {
    let results_root = optional_results_root(args.results_root);
    let output_dir = config::assets_dir(args.output_dir);

    let path = generate_stepwise_overlay(
        &results_root,
        args.old_glob.as_deref(),
        args.new_glob.as_deref(),
        args.old_csv.as_deref(),
        &output_dir,
    )?;
    report_outputs(&[path]);
    Ok(())
}

fn run_scalability(args: ScalabilityArgs) -> Result<()> {
    let results_root = optional_results_root(args.results_root);
    let output_dir = config::assets_dir(args.output_dir);
    let journal = args
        .journal
        .unwrap_or_else(|| Path::new(ROUNDS_JOURNAL).to_path_buf());

    let path = generate_scalability(&results_root, &journal, &output_dir)?;
    report_outputs(&[path]);
    Ok(())
}

fn run_figures(args: FiguresArgs) -> Result<()> {
    if args.list {
        println!("{}", format_registry());
        return Ok(());
    }

    let output_dir = config::assets_dir(args.output_dir);
    let outputs = generate_figures(&output_dir, args.name.as_deref())?;
    report_outputs(&outputs);
    Ok(())
}
