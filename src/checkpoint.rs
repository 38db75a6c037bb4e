use crate::config::Config;
use crate::error::{DbForgeError, DfResult};
use crate::geometry::LayoutFile;
use crate::optimizer::Individual;
use crate::truth::TruthTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version written by this crate. Version 2 is still readable.
pub const CHECKPOINT_VERSION: u64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    #[serde(flatten)]
    pub config: Config,
    pub truth_table: TruthTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub best_individual: String,
    pub population: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualStats {
    pub gc: String,
    pub f: f64,
    pub db: usize,
}

/// Everything needed to continue a run exactly where it stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub version: u64,
    pub run_id: String,
    pub options: RunOptions,
    pub random_seed: String,
    pub random_state: u64,
    pub generations: Vec<GenerationRecord>,
    /// Insertion ordered; serialized as `[[id, {gc, f, db}], ...]`.
    individuals: Vec<(String, IndividualStats)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_file: Option<LayoutFile>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Read-only shape of version 2 files.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunStateV2 {
    run_id: String,
    options: RunOptions,
    random_seed: String,
    random_state: u64,
    generations: Vec<GenerationRecord>,
    individuals: Vec<(String, (String, f64))>,
}

impl From<RunStateV2> for RunState {
    fn from(v2: RunStateV2) -> Self {
        let individuals = v2
            .individuals
            .into_iter()
            .map(|(id, (gc, f))| {
                let db = gc.chars().filter(|&c| c != '0').count();
                (id, IndividualStats { gc, f, db })
            })
            .collect();
        let mut state = RunState {
            version: 2,
            run_id: v2.run_id,
            options: v2.options,
            random_seed: v2.random_seed,
            random_state: v2.random_state,
            generations: v2.generations,
            individuals,
            layout_file: None,
            index: HashMap::new(),
        };
        state.reindex();
        state
    }
}

impl RunState {
    pub fn new(
        run_id: impl Into<String>,
        options: RunOptions,
        random_seed: impl Into<String>,
        layout_file: LayoutFile,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            run_id: run_id.into(),
            options,
            random_seed: random_seed.into(),
            random_state: 0,
            generations: Vec::new(),
            individuals: Vec::new(),
            layout_file: Some(layout_file),
            index: HashMap::new(),
        }
    }

    /// Reads a checkpoint, rejecting unknown versions before building any state.
    pub fn load<P: AsRef<Path>>(path: P) -> DfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DbForgeError::Config(format!(
                "Failed to read checkpoint '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> DfResult<Self> {
        let raw: Value = serde_json::from_str(content)?;
        match raw.get("version") {
            Some(v) if v.as_u64() == Some(CHECKPOINT_VERSION) => {
                let mut state: RunState = serde_json::from_value(raw)?;
                state.reindex();
                Ok(state)
            }
            Some(v) if v.as_u64() == Some(2) => {
                let v2: RunStateV2 = serde_json::from_value(raw)?;
                Ok(v2.into())
            }
            Some(v) => Err(DbForgeError::UnsupportedVersion(v.to_string())),
            None => Err(DbForgeError::UnsupportedVersion("missing".into())),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .individuals
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
    }

    pub fn individuals(&self) -> &[(String, IndividualStats)] {
        &self.individuals
    }

    pub fn stats(&self, id: &str) -> Option<&IndividualStats> {
        self.index.get(id).map(|&i| &self.individuals[i].1)
    }

    /// Inserts or refreshes one entry, keeping its first position.
    pub fn record(&mut self, id: &str, stats: IndividualStats) {
        match self.index.get(id) {
            Some(&i) => self.individuals[i].1 = stats,
            None => {
                self.index.insert(id.to_string(), self.individuals.len());
                self.individuals.push((id.to_string(), stats));
            }
        }
    }

    /// Appends one ranked, evaluated generation to the history.
    pub fn record_generation(&mut self, population: &[Individual]) {
        let mut ids = Vec::with_capacity(population.len());
        for ind in population {
            let id = ind.id().unwrap_or_default().to_string();
            self.record(
                &id,
                IndividualStats {
                    gc: ind.genetic_code(),
                    f: ind.score(),
                    db: ind.db_count(),
                },
            );
            ids.push(id);
        }
        self.generations.push(GenerationRecord {
            best_individual: ids.first().cloned().unwrap_or_default(),
            population: ids,
        });
    }

    /// Rebuilds the last recorded population as evaluated individuals.
    pub fn last_population(&self, width: usize, height: usize) -> DfResult<Vec<Individual>> {
        let last = self.generations.last().ok_or_else(|| {
            DbForgeError::Validation("Checkpoint contains no generations.".into())
        })?;
        last.population
            .iter()
            .map(|id| {
                let stats = self.stats(id).ok_or_else(|| {
                    DbForgeError::Validation(format!(
                        "Individual '{}' is missing from the statistics table.",
                        id
                    ))
                })?;
                Ok(Individual::from_code(width, height, &stats.gc)?.with_fitness(stats.f, id))
            })
            .collect()
    }

    pub fn best_of_last_generation(&self) -> Option<(&str, &IndividualStats)> {
        let id = &self.generations.last()?.best_individual;
        self.stats(id).map(|s| (id.as_str(), s))
    }

    pub fn to_json(&self) -> DfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes `<dir>/<run id>.json` through a hidden swap file.
    pub fn save(&self, dir: &Path) -> DfResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let target = dir.join(format!("{}.json", self.run_id));
        let swap = dir.join(format!(".{}.json.swp", self.run_id));
        atomic_write(&swap, &target, self.to_json()?.as_bytes())?;
        Ok(target)
    }
}

/// Writes `contents` to `temp`, syncs it, then renames it over `path`.
pub fn atomic_write(temp: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    {
        let mut file = fs::File::create(temp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(temp, path)
}
