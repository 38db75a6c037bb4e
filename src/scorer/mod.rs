pub mod types;

pub use self::types::{EvaluationReport, RowReport};
use crate::config::{EvaluationMode, EvaluationParams, SimulationParameters};
use crate::error::DfResult;
use crate::layout::Layout;
use crate::oracle::{Oracle, SimulationJob, SimulationResult};
use crate::truth::{bit_string, TruthRow, TruthTable};
use std::sync::Arc;
use tracing::debug;

/// Scores a layout snapshot against a truth table by querying an oracle.
///
/// Shared across the evaluation pool; it holds no mutable state.
#[derive(Clone)]
pub struct Evaluator {
    oracle: Arc<dyn Oracle>,
    params: EvaluationParams,
    simulation: SimulationParameters,
    name: String,
}

impl Evaluator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        params: EvaluationParams,
        simulation: SimulationParameters,
        name: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            params,
            simulation,
            name: name.into(),
        }
    }

    /// Same oracle and simulation parameters, different scoring options.
    pub fn with_params(&self, params: EvaluationParams) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    pub fn params(&self) -> &EvaluationParams {
        &self.params
    }

    pub fn simulation(&self) -> &SimulationParameters {
        &self.simulation
    }

    /// Best attainable score for `table` in the configured mode.
    pub fn max_score(&self, table: &TruthTable) -> f64 {
        match self.params.mode {
            EvaluationMode::Exact => (table.len() * table.output_len()) as f64,
            EvaluationMode::Statistical => 1.0,
        }
    }

    pub fn evaluate(&self, layout: &Layout, table: &TruthTable) -> DfResult<EvaluationReport> {
        table.check_against(layout)?;
        match self.params.mode {
            EvaluationMode::Exact => self.evaluate_exact(layout, table),
            EvaluationMode::Statistical => self.evaluate_statistical(layout, table),
        }
    }

    fn simulate(&self, layout: &Layout, input: &[bool]) -> DfResult<Option<SimulationResult>> {
        let job = SimulationJob {
            name: &self.name,
            layout,
            input,
            parameters: &self.simulation,
            retain_files: self.params.retain_files,
            export_artifacts: self.params.export_artifacts,
        };
        self.oracle.simulate(&job)
    }

    fn evaluate_exact(&self, layout: &Layout, table: &TruthTable) -> DfResult<EvaluationReport> {
        let mut passed = true;
        let mut score = 0usize;
        let mut rows = Vec::with_capacity(table.len());

        for row in table.rows() {
            let result = self.simulate(layout, &row.input)?;
            let matches = match &result {
                Some(r) => matching_bits(&row.output, &r.outputs),
                None => 0,
            };
            let row_passed = result.is_some() && matches == row.output.len();
            score += matches;

            debug!(
                "layout {} input {}: {}/{} bits",
                layout.id(),
                bit_string(&row.input),
                matches,
                row.output.len()
            );

            rows.push(RowReport {
                input: row.input.clone(),
                expected: row.output.clone(),
                observed: result.map(|r| r.outputs),
                accuracy: Vec::new(),
                passed: row_passed,
            });

            if !row_passed {
                passed = false;
                if self.params.fail_fast {
                    break;
                }
            }
        }

        Ok(EvaluationReport {
            passed,
            score: score as f64,
            max_score: (table.len() * table.output_len()) as f64,
            rows,
        })
    }

    fn evaluate_statistical(
        &self,
        layout: &Layout,
        table: &TruthTable,
    ) -> DfResult<EvaluationReport> {
        let mut passed = true;
        let mut rows = Vec::with_capacity(table.len());
        let mut row_means = vec![0.0; table.len()];

        for (i, row) in table.rows().iter().enumerate() {
            let accuracy = self.row_accuracy(layout, row)?;
            let row_passed = accuracy.iter().all(|&a| a >= self.params.threshold);
            row_means[i] = accuracy.iter().sum::<f64>() / accuracy.len() as f64;

            debug!(
                "layout {} input {}: accuracy {:?}",
                layout.id(),
                bit_string(&row.input),
                accuracy
            );

            rows.push(RowReport {
                input: row.input.clone(),
                expected: row.output.clone(),
                observed: None,
                accuracy,
                passed: row_passed,
            });

            if !row_passed {
                passed = false;
                if self.params.fail_fast {
                    break;
                }
            }
        }

        Ok(EvaluationReport {
            passed,
            score: harmonic_mean(&row_means, self.params.zero_accuracy()),
            max_score: 1.0,
            rows,
        })
    }

    fn row_accuracy(&self, layout: &Layout, row: &TruthRow) -> DfResult<Vec<f64>> {
        let mut hits = vec![0usize; row.output.len()];
        for _ in 0..self.params.trials {
            if let Some(r) = self.simulate(layout, &row.input)? {
                for (bit, (expected, observed)) in row.output.iter().zip(&r.outputs).enumerate() {
                    if *observed == Some(*expected) {
                        hits[bit] += 1;
                    }
                }
            }
        }
        let trials = self.params.trials as f64;
        Ok(hits.into_iter().map(|h| h as f64 / trials).collect())
    }
}

/// Count of expected bits the observed outputs reproduce. Indeterminate
/// outputs never match.
pub fn matching_bits(expected: &[bool], observed: &[Option<bool>]) -> usize {
    expected
        .iter()
        .zip(observed)
        .filter(|(e, o)| **o == Some(**e))
        .count()
}

/// Harmonic mean with every zero replaced by `zero_replacement`.
///
/// A zero that stays zero drives the result to zero.
pub fn harmonic_mean(values: &[f64], zero_replacement: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut inv_sum = 0.0;
    for &v in values {
        let v = if v == 0.0 { zero_replacement } else { v };
        if v <= 0.0 {
            return 0.0;
        }
        inv_sum += 1.0 / v;
    }
    values.len() as f64 / inv_sum
}
