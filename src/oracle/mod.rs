pub mod artifacts;
pub mod process;

pub use self::process::ProcessOracle;

use crate::config::SimulationParameters;
use crate::error::DfResult;
use crate::layout::Layout;
use crate::truth::bit_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One simulation request: a layout snapshot driven by one input vector.
pub struct SimulationJob<'a> {
    /// Base name used for file naming (layout file stem).
    pub name: &'a str,
    pub layout: &'a Layout,
    pub input: &'a [bool],
    pub parameters: &'a SimulationParameters,
    pub retain_files: bool,
    pub export_artifacts: bool,
}

/// The ground state picked out of a simulator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub energy: f64,
    pub charges: String,
    pub outputs: Vec<Option<bool>>,
}

impl SimulationResult {
    pub fn from_distribution(layout: &Layout, dist: &ElectronDistribution) -> Self {
        Self {
            energy: dist.energy,
            charges: dist.config.clone(),
            outputs: layout.decode_outputs(&dist.config),
        }
    }
}

/// A black-box scorer for one layout and one input vector.
///
/// `Ok(None)` means the simulator produced no physically valid answer; that
/// is a row failure, never an error. `Err` is reserved for failures to run
/// the simulator at all.
pub trait Oracle: Send + Sync {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDot {
    pub index: usize,
    pub n: i32,
    pub m: i32,
    pub l: i32,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// Document handed to the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationProblem {
    pub name: String,
    pub layout_id: String,
    pub input: String,
    pub dots: Vec<ProblemDot>,
    pub parameters: BTreeMap<String, String>,
}

impl SimulationProblem {
    pub fn build(job: &SimulationJob) -> DfResult<Self> {
        let dots = job
            .layout
            .layout_for_input(job.input)?
            .into_iter()
            .map(|d| {
                let (x, y) = d.dot.physical_location();
                ProblemDot {
                    index: d.index,
                    n: d.dot.n,
                    m: d.dot.m,
                    l: d.dot.l,
                    x,
                    y,
                    color: d.dot.color,
                }
            })
            .collect();

        Ok(Self {
            name: job.name.to_string(),
            layout_id: job.layout.id().to_string(),
            input: bit_string(job.input),
            dots,
            parameters: job.parameters.resolved(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> DfResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronDistribution {
    pub energy: f64,
    pub physically_valid: bool,
    /// One symbol per dot, in problem index order (`-` charged, `0` neutral).
    pub config: String,
}

/// Document produced by the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    #[serde(default)]
    pub distributions: Vec<ElectronDistribution>,
}

impl SimulationOutput {
    pub fn load<P: AsRef<Path>>(path: P) -> DfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Lowest-energy physically valid distribution.
    pub fn ground_state(&self) -> Option<&ElectronDistribution> {
        self.distributions
            .iter()
            .filter(|d| d.physically_valid)
            .min_by(|a, b| a.energy.total_cmp(&b.energy))
    }
}
