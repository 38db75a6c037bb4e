pub mod resume;
pub mod search;
pub mod validate;

use clap::Args;
use dbforge::oracle::{Oracle, ProcessOracle};
use dbforge::random::random_id;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where the simulator lives and where runs write their files.
#[derive(Args, Debug, Clone)]
pub struct SimulatorArgs {
    /// Simulator executable, called as `<simulator> <problem.json> <result.json>`.
    #[arg(long, default_value = "simanneal")]
    pub simulator: PathBuf,

    /// Scratch directory for simulation problems and results.
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Directory receiving run checkpoints.
    #[arg(long, default_value = "runs")]
    pub runs_dir: PathBuf,
}

impl SimulatorArgs {
    pub fn oracle(&self, timeout_secs: u64) -> Arc<dyn Oracle> {
        Arc::new(ProcessOracle::new(
            &self.simulator,
            &self.work_dir,
            Duration::from_secs(timeout_secs),
        ))
    }
}

/// `<prefix>_<random hex>`, or just the hex part.
pub fn new_run_id(prefix: Option<&str>) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}_{}", p, random_id()),
        _ => random_id(),
    }
}
