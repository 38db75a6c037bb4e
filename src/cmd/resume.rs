use super::{new_run_id, SimulatorArgs};
use crate::reports;
use clap::Args;
use dbforge::checkpoint::RunState;
use dbforge::error::DfResult;
use dbforge::geometry::LayoutFile;
use dbforge::optimizer::runner::{Evolution, RunSettings};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ResumeArgs {
    /// Checkpoint written by a previous run.
    pub checkpoint: PathBuf,

    /// Layout file; only for checkpoints that do not embed one.
    #[arg(short = 'l', long)]
    pub layout: Option<PathBuf>,

    #[arg(short = 'n', long, default_value_t = 30)]
    pub generations: usize,

    #[arg(long)]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub simulator: SimulatorArgs,
}

pub fn run(args: &ResumeArgs) -> DfResult<()> {
    info!("Resuming from previous run...");
    let state = RunState::load(&args.checkpoint)?;
    let layout = args.layout.as_ref().map(LayoutFile::open).transpose()?;
    let oracle = args
        .simulator
        .oracle(state.options.config.evaluation.timeout_secs);

    let settings = RunSettings {
        run_id: new_run_id(args.prefix.as_deref()),
        seed: None,
        runs_dir: args.simulator.runs_dir.clone(),
    };

    info!("Process PID: {}", std::process::id());
    let mut evolution = Evolution::resume(state, layout, oracle, settings)?;
    reports::print_run_header(evolution.state());

    evolution.run(args.generations, &reports::ConsoleProgress)?;
    reports::print_run_footer(&evolution);
    Ok(())
}
