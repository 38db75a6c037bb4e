#![allow(dead_code)]

use dbforge::config::{EvaluationMode, EvaluationParams, SimulationParameters};
use dbforge::error::{DbForgeError, DfResult};
use dbforge::geometry::{Dot, LayoutDocument, LayoutFile, AREA_COLOR};
use dbforge::layout::{Layout, CHARGED};
use dbforge::oracle::{Oracle, SimulationJob, SimulationResult};
use dbforge::scorer::Evaluator;
use dbforge::truth::{TruthRow, TruthTable};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 4x3 mutable area, two inputs, one output pair, one background dot.
///
/// Index layout: background 0, output pair (1, 2), inner from 3.
pub fn fixture_dots() -> Vec<Dot> {
    vec![
        Dot::new(0, 0, 0, AREA_COLOR),
        Dot::new(3, 0, 0, AREA_COLOR),
        Dot::new(0, 2, 1, AREA_COLOR),
        Dot::new(3, 2, 1, AREA_COLOR),
        Dot::new(-4, 0, 0, "#FFFFFF02"),
        Dot::new(-4, 2, 0, "#ffffff01"),
        Dot::new(6, 1, 0, "#ffff0001"),
        Dot::new(7, 1, 0, "#ffff0002"),
        Dot::new(-2, 1, 0, "#ffc0c0c0"),
    ]
}

pub fn fixture_layout() -> Layout {
    Layout::parse(fixture_dots()).unwrap()
}

/// Writes the fixture as `<dir>/gate.json` and opens it.
pub fn fixture_file(dir: &Path) -> LayoutFile {
    let path = dir.join("gate.json");
    LayoutDocument {
        name: Some("gate".into()),
        dots: fixture_dots(),
    }
    .save(&path)
    .unwrap();
    LayoutFile::open(&path).unwrap()
}

fn row(input: [bool; 2], output: bool) -> TruthRow {
    TruthRow {
        input: input.to_vec(),
        output: vec![output],
    }
}

pub fn xor_table() -> TruthTable {
    TruthTable::new(vec![
        row([false, false], false),
        row([false, true], true),
        row([true, false], true),
        row([true, true], false),
    ])
    .unwrap()
}

/// Electron distribution that decodes to `outputs` on `layout`.
pub fn charges(layout: &Layout, input: &[bool], outputs: &[bool]) -> String {
    let n = layout.layout_for_input(input).unwrap().len();
    let mut chars = vec!['0'; n];
    for (&(a, b), &v) in layout.output_pairs().iter().zip(outputs) {
        if v {
            chars[b] = CHARGED;
        } else {
            chars[a] = CHARGED;
        }
    }
    chars.into_iter().collect()
}

fn result_for(job: &SimulationJob, outputs: &[bool]) -> SimulationResult {
    let config = charges(job.layout, job.input, outputs);
    SimulationResult {
        energy: -1.0,
        outputs: job.layout.decode_outputs(&config),
        charges: config,
    }
}

/// Output is the parity of active inputs plus placed DBs.
///
/// Against XOR, layouts with an even DB count are perfect and odd ones score zero.
#[derive(Default)]
pub struct ParityOracle {
    pub calls: AtomicUsize,
}

impl Oracle for ParityOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = job.input.iter().filter(|&&b| b).count();
        let bit = (active + job.layout.inner().len()) % 2 == 1;
        Ok(Some(result_for(job, &vec![bit; job.layout.output_count()])))
    }
}

/// Output is the XOR of the inputs, unless the DB count is a multiple of
/// three, in which case every row reads wrong. Gives the search a varied
/// fitness landscape.
pub struct LandscapeOracle;

impl Oracle for LandscapeOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        let xor = job.input.iter().filter(|&&b| b).count() % 2 == 1;
        let n = job.layout.inner().len();
        let bit = if n % 3 == 0 { !xor } else { xor };
        // Even counts above zero lose the second half of the table
        let bit = if n % 2 == 0 && n > 0 && job.input[0] { !bit } else { bit };
        Ok(Some(result_for(job, &[bit])))
    }
}

/// Answers from the truth table, optionally flipping the first bit of one row.
pub struct TableOracle {
    pub table: TruthTable,
    pub flip_row: Option<usize>,
    pub calls: AtomicUsize,
}

impl TableOracle {
    pub fn new(table: TruthTable, flip_row: Option<usize>) -> Self {
        Self {
            table,
            flip_row,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Oracle for TableOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (idx, row) = self
            .table
            .rows()
            .iter()
            .enumerate()
            .find(|(_, r)| r.input == job.input)
            .ok_or_else(|| DbForgeError::Oracle("unknown input".into()))?;
        let mut outputs = row.output.clone();
        if self.flip_row == Some(idx) {
            outputs[0] = !outputs[0];
        }
        Ok(Some(result_for(job, &outputs)))
    }
}

/// Both dots of every pair read the same: all outputs indeterminate.
pub struct IndeterminateOracle;

impl Oracle for IndeterminateOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        let n = job.layout.layout_for_input(job.input)?.len();
        let config: String = std::iter::repeat('0').take(n).collect();
        Ok(Some(SimulationResult {
            energy: 0.0,
            outputs: job.layout.decode_outputs(&config),
            charges: config,
        }))
    }
}

/// Never finds a physically valid distribution.
#[derive(Default)]
pub struct SilentOracle {
    pub calls: AtomicUsize,
}

impl Oracle for SilentOracle {
    fn simulate(&self, _: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

pub struct BrokenOracle;

impl Oracle for BrokenOracle {
    fn simulate(&self, _: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        Err(DbForgeError::Oracle("simulator not found".into()))
    }
}

/// Coin-flip outputs from a seeded generator.
pub struct CoinOracle {
    rng: Mutex<fastrand::Rng>,
}

impl CoinOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Oracle for CoinOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        let outputs: Vec<bool> = {
            let mut rng = self.rng.lock().unwrap();
            (0..job.layout.output_count()).map(|_| rng.bool()).collect()
        };
        Ok(Some(result_for(job, &outputs)))
    }
}

pub fn exact(fail_fast: bool) -> EvaluationParams {
    EvaluationParams {
        mode: EvaluationMode::Exact,
        fail_fast,
        ..Default::default()
    }
}

pub fn statistical(trials: usize, threshold: f64) -> EvaluationParams {
    EvaluationParams {
        mode: EvaluationMode::Statistical,
        trials,
        threshold,
        ..Default::default()
    }
}

pub fn evaluator(oracle: Arc<dyn Oracle>, params: EvaluationParams) -> Evaluator {
    Evaluator::new(oracle, params, SimulationParameters::default(), "gate")
}
