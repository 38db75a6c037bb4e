use crate::checkpoint::RunState;
use crate::config::{EvaluationMode, EvaluationParams};
use crate::error::DfResult;
use crate::geometry::LayoutFile;
use crate::layout::Layout;
use crate::optimizer::runner::layout_for_code;
use crate::optimizer::Individual;
use crate::oracle::Oracle;
use crate::scorer::Evaluator;
use crate::truth::TruthTable;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One distinct genetic code among the run's best-scoring individuals.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPerformer {
    /// Earliest id recorded for this genetic code.
    pub id: String,
    pub genetic_code: String,
    pub fitness: f64,
    pub db_count: usize,
    /// How many ids share this genetic code.
    pub copies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted { runs: usize },
    Rejected { runs: usize },
    Skipped,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Verdict::Rejected { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPreview {
    pub id: String,
    pub gc: String,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatistics {
    pub min_fitness: f64,
    pub avg_fitness: f64,
    pub best_fitness: f64,
    pub best_individual: BestPreview,
}

#[derive(Debug, Clone)]
pub struct ValidationSummary {
    pub destination: PathBuf,
    pub max_fitness: f64,
    pub candidates: usize,
    pub accepted: Vec<String>,
}

/// Every individual sharing the run's maximum fitness, grouped by genetic code.
pub fn top_performers(state: &RunState) -> Vec<TopPerformer> {
    let max = state
        .individuals()
        .iter()
        .map(|(_, s)| s.f)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut out: Vec<TopPerformer> = Vec::new();
    let mut by_code: HashMap<&str, usize> = HashMap::new();
    for (id, s) in state.individuals() {
        if s.f < max {
            continue;
        }
        match by_code.get(s.gc.as_str()) {
            Some(&i) => out[i].copies += 1,
            None => {
                by_code.insert(&s.gc, out.len());
                out.push(TopPerformer {
                    id: id.clone(),
                    genetic_code: s.gc.clone(),
                    fitness: s.f,
                    db_count: s.db,
                    copies: 1,
                });
            }
        }
    }
    out
}

/// Min/avg/best fitness of each recorded generation, with a preview of its best.
pub fn generation_statistics(
    state: &RunState,
    width: usize,
    height: usize,
) -> Vec<GenerationStatistics> {
    let mut out = Vec::with_capacity(state.generations.len());
    for generation in &state.generations {
        let Some(best) = state.stats(&generation.best_individual) else {
            warn!(
                "Best individual '{}' missing from statistics table",
                generation.best_individual
            );
            continue;
        };
        let members: HashSet<&str> = generation.population.iter().map(String::as_str).collect();
        let fitnesses: Vec<f64> = state
            .individuals()
            .iter()
            .filter(|(id, _)| members.contains(id.as_str()))
            .map(|(_, s)| s.f)
            .collect();
        let min = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        let avg = if fitnesses.is_empty() {
            0.0
        } else {
            fitnesses.iter().sum::<f64>() / fitnesses.len() as f64
        };
        let preview = Individual::from_code(width, height, &best.gc)
            .map(|i| i.preview())
            .unwrap_or_default();

        out.push(GenerationStatistics {
            min_fitness: if fitnesses.is_empty() { 0.0 } else { min },
            avg_fitness: avg,
            best_fitness: best.f,
            best_individual: BestPreview {
                id: generation.best_individual.clone(),
                gc: best.gc.clone(),
                preview,
            },
        });
    }
    out
}

/// `base`, or `base (1)`, `base (2)`, ... whichever does not exist yet.
pub fn unique_destination(base: &Path) -> PathBuf {
    let mut candidate = base.to_path_buf();
    let mut i = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{} ({})", base.display(), i));
        i += 1;
    }
    candidate
}

/// `results/<layout name>/<checkpoint file stem>`.
pub fn default_destination(layout: &LayoutFile, checkpoint: &Path) -> PathBuf {
    let stem = checkpoint
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "run".to_string());
    PathBuf::from("results").join(layout.name()).join(stem)
}

/// Mirrors every line to the log and to `output.log`.
struct Transcript {
    file: File,
}

impl Transcript {
    fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::create(path)?,
        })
    }

    fn line(&mut self, msg: &str) -> io::Result<()> {
        info!("{}", msg);
        writeln!(self.file, "{}", msg)
    }
}

/// Re-checks a run's top performers with a strict exact-mode evaluator.
pub struct Verifier {
    layout: Layout,
    table: TruthTable,
    evaluator: Evaluator,
    repeats: usize,
}

impl Verifier {
    pub fn new(
        state: &RunState,
        layout_file: &LayoutFile,
        oracle: Arc<dyn Oracle>,
        repeats: usize,
    ) -> DfResult<Self> {
        let layout = Layout::parse(layout_file.document()?.dots)?;
        let table = state.options.truth_table.clone();
        table.check_against(&layout)?;

        let config = &state.options.config;
        let params = EvaluationParams {
            mode: EvaluationMode::Exact,
            fail_fast: true,
            retain_files: false,
            export_artifacts: false,
            ..config.evaluation.clone()
        };
        let simulation = config
            .simulation_parameters
            .clone()
            .with("num_instances", "-1");

        Ok(Self {
            layout,
            table,
            evaluator: Evaluator::new(oracle, params, simulation, layout_file.name()),
            repeats,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Runs up to `repeats` strict evaluations, stopping at the first failure.
    pub fn verify(&self, candidate: &TopPerformer) -> DfResult<Verdict> {
        if self.repeats == 0 {
            return Ok(Verdict::Skipped);
        }
        let (_, snapshot) = layout_for_code(&self.layout, &candidate.genetic_code)?;
        for run in 1..=self.repeats {
            let report = self.evaluator.evaluate(&snapshot, &self.table)?;
            if !report.passed {
                return Ok(Verdict::Rejected { runs: run });
            }
        }
        Ok(Verdict::Accepted { runs: self.repeats })
    }

    /// Writes `<dir>/<id>.json` with every input active.
    pub fn export(&self, candidate: &TopPerformer, dir: &Path) -> DfResult<PathBuf> {
        let (_, snapshot) = layout_for_code(&self.layout, &candidate.genetic_code)?;
        let all_on = vec![true; self.layout.input_count()];
        let path = dir.join(format!("{}.json", candidate.id));
        snapshot
            .to_document(Some(candidate.id.clone()), &all_on)?
            .save(&path)?;
        Ok(path)
    }

    /// Full pass: dedup, re-check, export, then `statistics.json` and `output.log`.
    pub fn run(&self, state: &RunState, destination: &Path) -> DfResult<ValidationSummary> {
        fs::create_dir_all(destination)?;
        let mut log = Transcript::create(&destination.join("output.log"))?;

        let candidates = top_performers(state);
        let max_fitness = candidates.first().map(|c| c.fitness).unwrap_or(0.0);
        log.line(&format!("Checkpoint maximum fitness: {}.", max_fitness))?;
        log.line(&format!(
            "Simulation will be run {} times for each individual.",
            self.repeats
        ))?;
        log.line(&format!("Analyzing {} unique individuals.\n", candidates.len()))?;

        let mut accepted = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            let preview = Individual::from_code(
                self.layout.area().width(),
                self.layout.area().height(),
                &candidate.genetic_code,
            )?
            .preview();
            log.line(&format!(
                "Individual {} of {} (\"{}\") ({} copies found):\n{}",
                i + 1,
                candidates.len(),
                candidate.id,
                candidate.copies,
                preview
            ))?;

            let verdict = self.verify(candidate)?;
            match verdict {
                Verdict::Skipped => log.line("Simulation skipped.\n")?,
                Verdict::Accepted { runs } => log.line(&format!("OK after {} runs.\n", runs))?,
                Verdict::Rejected { runs } => log.line(&format!(
                    "Inaccurate results on run {}, rejected.\n",
                    runs
                ))?,
            }

            if verdict.is_accepted() {
                if let Err(e) = self.export(candidate, destination) {
                    warn!("Failed to export layout {}, ignored: {}", candidate.id, e);
                    log.line(&format!("Export of {} failed: {}\n", candidate.id, e))?;
                }
                accepted.push(candidate.id.clone());
            }
        }

        if self.repeats > 0 {
            log.line(&format!("Generated {} accurate individuals.", accepted.len()))?;
        } else {
            log.line(&format!(
                "Generated {} individuals with fitness {}.",
                accepted.len(),
                max_fitness
            ))?;
        }

        let area = self.layout.area();
        let stats = generation_statistics(state, area.width(), area.height());
        fs::write(
            destination.join("statistics.json"),
            serde_json::to_string_pretty(&stats)?,
        )?;
        log.line("Done")?;

        Ok(ValidationSummary {
            destination: destination.to_path_buf(),
            max_fitness,
            candidates: candidates.len(),
            accepted,
        })
    }
}
