use crate::checkpoint::{RunOptions, RunState, CHECKPOINT_VERSION};
use crate::config::Config;
use crate::error::{DbForgeError, DfResult};
use crate::geometry::LayoutFile;
use crate::layout::Layout;
use crate::optimizer::{GaParams, GeneticAlgorithm, Individual};
use crate::oracle::Oracle;
use crate::random::DeterministicRandom;
use crate::scorer::Evaluator;
use crate::truth::TruthTable;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Where and under which name a run persists itself.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub run_id: String,
    /// Fresh runs only; `None` draws a seed from entropy.
    pub seed: Option<String>,
    pub runs_dir: PathBuf,
}

/// Per-generation digest handed to a [`ProgressCallback`].
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// 1-based.
    pub generation: usize,
    pub last_generation: usize,
    pub best_id: String,
    pub best_score: f64,
    pub max_score: f64,
    pub best_db_count: usize,
    pub min_db_count: usize,
    pub max_db_count: usize,
    pub elapsed: Duration,
    pub checkpoint: Option<PathBuf>,
}

/// A trait for receiving updates during evolution.
/// Boolean return value indicates if the run should continue (true) or stop (false).
pub trait ProgressCallback {
    fn on_generation(&self, summary: &GenerationSummary, best: &Individual) -> bool;
}

/// Callback that never interrupts the run.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_generation(&self, _: &GenerationSummary, _: &Individual) -> bool {
        true
    }
}

pub struct Evolution {
    state: RunState,
    ga: GeneticAlgorithm,
    rng: DeterministicRandom,
    layout: Layout,
    evaluator: Evaluator,
    runs_dir: PathBuf,
}

impl Evolution {
    pub fn start(
        config: Config,
        table: TruthTable,
        layout_file: LayoutFile,
        oracle: Arc<dyn Oracle>,
        settings: RunSettings,
    ) -> DfResult<Self> {
        config.validate()?;
        let layout = Layout::parse(layout_file.document()?.dots)?;
        table.check_against(&layout)?;

        let mut rng = match settings.seed {
            Some(seed) => DeterministicRandom::new(seed),
            None => DeterministicRandom::from_entropy(),
        };

        let mut ga = GeneticAlgorithm::new(GaParams::from(&config.search));
        let area = layout.area();
        ga.generate_population(area.width(), area.height(), &mut rng);

        let evaluator = Evaluator::new(
            oracle,
            config.evaluation.clone(),
            config.simulation_parameters.clone(),
            layout_file.name(),
        );
        let state = RunState::new(
            settings.run_id,
            RunOptions {
                config,
                truth_table: table,
            },
            rng.seed(),
            layout_file,
        );

        Ok(Self {
            state,
            ga,
            rng,
            layout,
            evaluator,
            runs_dir: settings.runs_dir,
        })
    }

    /// Continues a checkpointed run with the generation after its last one.
    ///
    /// `layout_override` is required for version 2 checkpoints and refused
    /// for checkpoints that embed their layout.
    pub fn resume(
        mut state: RunState,
        layout_override: Option<LayoutFile>,
        oracle: Arc<dyn Oracle>,
        settings: RunSettings,
    ) -> DfResult<Self> {
        let layout_file = resolve_layout_file(&state, layout_override)?;
        let config = state.options.config.clone();
        config.validate()?;
        let layout = Layout::parse(layout_file.document()?.dots)?;
        state.options.truth_table.check_against(&layout)?;

        let area = layout.area();
        let population = state.last_population(area.width(), area.height())?;
        let mut rng = DeterministicRandom::restore(state.random_seed.clone(), state.random_state);

        let mut ga = GeneticAlgorithm::new(GaParams::from(&config.search));
        ga.restore(state.generations.len() - 1, population);
        ga.next_generation(&mut rng)?;

        if let Some((id, best)) = state.best_of_last_generation() {
            info!("Resuming run {} from generation {}", state.run_id, state.generations.len());
            info!("Current best individual: {} (DB count: {}; fitness: {})", id, best.db, best.f);
        }

        let evaluator = Evaluator::new(
            oracle,
            config.evaluation.clone(),
            config.simulation_parameters.clone(),
            layout_file.name(),
        );
        state.version = CHECKPOINT_VERSION;
        state.run_id = settings.run_id;
        state.layout_file = Some(layout_file);

        Ok(Self {
            state,
            ga,
            rng,
            layout,
            evaluator,
            runs_dir: settings.runs_dir,
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn ga(&self) -> &GeneticAlgorithm {
        &self.ga
    }

    pub fn rng(&self) -> &DeterministicRandom {
        &self.rng
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.runs_dir.join(format!("{}.json", self.state.run_id))
    }

    /// Drives `generations` more generations, checkpointing after each.
    pub fn run<CB: ProgressCallback>(&mut self, generations: usize, callback: &CB) -> DfResult<()> {
        let first = self.ga.generation();
        let last = first + generations;

        for i in first..last {
            let start = Instant::now();
            info!("Generation {} of {}", i + 1, last);

            let (min_db, max_db) = db_count_range(self.ga.population());
            info!("Min DB count: {} | Max DB count: {}", min_db, max_db);

            let table = &self.state.options.truth_table;
            self.ga.evaluate_population(&self.layout, table, &self.evaluator)?;
            let max_score = self.evaluator.max_score(table);

            let best = self
                .ga
                .best()
                .cloned()
                .ok_or_else(|| DbForgeError::Validation("Population is empty.".into()))?;
            let best_id = best.id().unwrap_or_default().to_string();
            info!("Best individual: {} ({}/{})", best_id, best.score(), max_score);

            self.state.record_generation(self.ga.population());
            self.state.random_state = self.rng.draws();
            let checkpoint = self.write_checkpoint();

            let summary = GenerationSummary {
                generation: i + 1,
                last_generation: last,
                best_id,
                best_score: best.score(),
                max_score,
                best_db_count: best.db_count(),
                min_db_count: min_db,
                max_db_count: max_db,
                elapsed: start.elapsed(),
                checkpoint,
            };
            info!("(took {} seconds)", summary.elapsed.as_secs());

            if !callback.on_generation(&summary, &best) {
                info!("Run stopped after generation {}", i + 1);
                break;
            }
            if i + 1 < last {
                self.ga.next_generation(&mut self.rng)?;
            }
        }
        Ok(())
    }

    /// Checkpoint failures are reported but never stop the run.
    fn write_checkpoint(&self) -> Option<PathBuf> {
        match self.state.save(&self.runs_dir) {
            Ok(path) => {
                info!("Run log saved at: {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Error writing run log: {}", e);
                None
            }
        }
    }
}

/// The layout a checkpoint runs on: embedded (v3) or supplied (v2), never both.
pub fn resolve_layout_file(
    state: &RunState,
    layout_override: Option<LayoutFile>,
) -> DfResult<LayoutFile> {
    match (&state.layout_file, layout_override) {
        (Some(_), Some(_)) => Err(DbForgeError::Config(
            "The checkpoint already embeds its layout; do not pass one.".into(),
        )),
        (Some(embedded), None) => Ok(embedded.clone()),
        (None, Some(given)) => Ok(given),
        (None, None) => Err(DbForgeError::Config(format!(
            "Checkpoint version {} carries no layout; pass the layout file explicitly.",
            state.version
        ))),
    }
}

fn db_count_range(population: &[Individual]) -> (usize, usize) {
    let counts = population.iter().map(|i| i.db_count());
    let min = counts.clone().min().unwrap_or(0);
    let max = counts.max().unwrap_or(0);
    (min, max)
}

/// Layout snapshot for one of the run's individuals, given its genetic code.
pub fn layout_for_code(layout: &Layout, genetic_code: &str) -> DfResult<(Individual, Layout)> {
    let area = layout.area();
    let ind = Individual::from_code(area.width(), area.height(), genetic_code)?;
    let snapshot = layout.with_inner(ind.phenotype(&area))?;
    Ok((ind, snapshot))
}
