use super::SimulatorArgs;
use crate::reports;
use clap::Args;
use dbforge::checkpoint::RunState;
use dbforge::error::DfResult;
use dbforge::geometry::LayoutFile;
use dbforge::optimizer::runner::resolve_layout_file;
use dbforge::verifier::{default_destination, top_performers, unique_destination, Verifier};
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Checkpoint to analyze.
    pub checkpoint: PathBuf,

    /// Strict re-evaluations per unique individual.
    #[arg(short = 'n', long, conflicts_with = "skip_check")]
    pub repeats: Option<usize>,

    /// Export every top individual without simulating.
    #[arg(long, default_value_t = false)]
    pub skip_check: bool,

    /// Destination folder (default: results/<layout>/<checkpoint>).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Layout file; only for checkpoints that do not embed one.
    #[arg(short = 'l', long)]
    pub layout: Option<PathBuf>,

    #[command(flatten)]
    pub simulator: SimulatorArgs,
}

impl ValidateArgs {
    fn repeats(&self) -> usize {
        if self.skip_check {
            0
        } else {
            self.repeats.unwrap_or(1)
        }
    }
}

pub fn run(args: &ValidateArgs) -> DfResult<()> {
    let state = RunState::load(&args.checkpoint)?;
    let layout_override = args.layout.as_ref().map(LayoutFile::open).transpose()?;
    let layout_file = resolve_layout_file(&state, layout_override)?;

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| default_destination(&layout_file, &args.checkpoint));
    let destination = unique_destination(&base);
    if destination != base {
        warn!(
            "Destination folder already exists, using \"{}\".",
            destination.display()
        );
    }

    let oracle = args
        .simulator
        .oracle(state.options.config.evaluation.timeout_secs);
    let verifier = Verifier::new(&state, &layout_file, oracle, args.repeats())?;
    let summary = verifier.run(&state, &destination)?;

    reports::print_validation_report(&top_performers(&state), &summary);
    Ok(())
}
