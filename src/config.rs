use crate::error::{DbForgeError, DfResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumString};

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    #[command(flatten)]
    #[serde(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub evaluation: EvaluationParams,
    #[arg(skip)]
    pub simulation_parameters: SimulationParameters,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
    #[arg(long, default_value_t = 50)]
    pub population_size: usize,
    #[arg(long, default_value_t = 0.9)]
    pub crossover_rate: f64,
    #[arg(long, default_value_t = 0.1)]
    pub mutation_rate: f64,
    #[arg(long, default_value_t = 2)]
    pub elitism_count: usize,

    // === Initial gene distribution (relative weights) ===
    #[arg(long, default_value_t = 0.90)]
    pub init_empty: f64,
    #[arg(long, default_value_t = 0.05)]
    pub init_up: f64,
    #[arg(long, default_value_t = 0.05)]
    pub init_down: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            elitism_count: 2,
            init_empty: 0.90,
            init_up: 0.05,
            init_down: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One simulation per row; score counts matching output bits.
    Exact,
    /// Repeated simulations per row; score is a harmonic mean of accuracies.
    Statistical,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationParams {
    #[arg(long, default_value_t = EvaluationMode::Exact)]
    pub mode: EvaluationMode,
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,
    #[arg(long, default_value_t = 10)]
    pub trials: usize,
    #[arg(long, default_value_t = 0.9)]
    pub threshold: f64,
    /// Stand-in for zero row accuracy in the harmonic mean (default: trials / 1000).
    #[arg(long)]
    pub zero_accuracy: Option<f64>,
    #[arg(long, default_value_t = 1)]
    pub max_concurrency: usize,
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,
    #[arg(long, default_value_t = false)]
    pub retain_files: bool,
    #[arg(long, default_value_t = false)]
    pub export_artifacts: bool,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Exact,
            fail_fast: false,
            trials: 10,
            threshold: 0.9,
            zero_accuracy: None,
            max_concurrency: 1,
            timeout_secs: 600,
            retain_files: false,
            export_artifacts: false,
        }
    }
}

impl EvaluationParams {
    pub fn zero_accuracy(&self) -> f64 {
        self.zero_accuracy
            .unwrap_or(self.trials as f64 / 1000.0)
    }
}

/// Simulator tuning, passed through verbatim as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SimulationParameters(pub BTreeMap<String, String>);

const SIMULATION_DEFAULTS: [(&str, &str); 17] = [
    ("T_e_inv_point", "0.09995"),
    ("T_init", "500"),
    ("T_min", "2"),
    ("T_schedule", "exponential"),
    ("anneal_cycles", "10000"),
    ("debye_length", "5"),
    ("eps_r", "5.6"),
    ("hop_attempt_factor", "5"),
    ("num_instances", "-1"),
    ("phys_validity_check_cycles", "10"),
    ("reset_T_during_v_freeze_reset", "false"),
    ("result_queue_size", "0.1"),
    ("strategic_v_freeze_reset", "false"),
    ("v_freeze_end_point", "0.4"),
    ("v_freeze_init", "-1"),
    ("v_freeze_reset", "-1"),
    ("v_freeze_threshold", "4"),
];
const DEFAULT_MUZM: &str = "-0.32";

impl SimulationParameters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Simulator defaults with user overrides on top. `mu` is an alias for `muzm`.
    pub fn resolved(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = SIMULATION_DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in &self.0 {
            out.insert(k.clone(), v.clone());
        }
        let muzm = self
            .get("muzm")
            .or_else(|| self.get("mu"))
            .unwrap_or(DEFAULT_MUZM)
            .to_string();
        out.insert("muzm".to_string(), muzm);
        out
    }
}

impl<'de> Deserialize<'de> for SimulationParameters {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(d)?;
        Ok(Self(
            raw.into_iter()
                .map(|(k, v)| {
                    let s = match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, s)
                })
                .collect(),
        ))
    }
}

/// `KEY=VALUE` for `--sim-param`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DbForgeError::Config(format!(
                "Failed to read options file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DbForgeError::Config(format!("Invalid options file '{}': {}", path.display(), e))
        })
    }

    /// Copies every argument the user typed on the command line over `self`.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(search.population_size);
        update_if_present!(search.crossover_rate);
        update_if_present!(search.mutation_rate);
        update_if_present!(search.elitism_count);
        update_if_present!(search.init_empty);
        update_if_present!(search.init_up);
        update_if_present!(search.init_down);

        update_if_present!(evaluation.mode);
        update_if_present!(evaluation.fail_fast);
        update_if_present!(evaluation.trials);
        update_if_present!(evaluation.threshold);
        update_if_present!(evaluation.zero_accuracy);
        update_if_present!(evaluation.max_concurrency);
        update_if_present!(evaluation.timeout_secs);
        update_if_present!(evaluation.retain_files);
        update_if_present!(evaluation.export_artifacts);
    }

    pub fn validate(&self) -> DfResult<()> {
        let s = &self.search;
        let e = &self.evaluation;

        if s.population_size == 0 {
            return Err(DbForgeError::Config("population_size must be at least 1".into()));
        }
        if s.elitism_count > s.population_size {
            return Err(DbForgeError::Config(format!(
                "elitism_count ({}) exceeds population_size ({})",
                s.elitism_count, s.population_size
            )));
        }
        for (name, rate) in [
            ("crossover_rate", s.crossover_rate),
            ("mutation_rate", s.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(DbForgeError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if s.crossover_rate + s.mutation_rate > 1.0 + 1e-9 {
            return Err(DbForgeError::Config(format!(
                "crossover_rate + mutation_rate must not exceed 1 (got {})",
                s.crossover_rate + s.mutation_rate
            )));
        }
        if s.init_empty < 0.0 || s.init_up < 0.0 || s.init_down < 0.0 {
            return Err(DbForgeError::Config("init weights must be non-negative".into()));
        }
        if s.init_empty + s.init_up + s.init_down <= 0.0 {
            return Err(DbForgeError::Config("init weights must not all be zero".into()));
        }

        if e.trials == 0 {
            return Err(DbForgeError::Config("trials must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&e.threshold) {
            return Err(DbForgeError::Config(format!(
                "threshold must be within [0, 1], got {}",
                e.threshold
            )));
        }
        if e.zero_accuracy() < 0.0 {
            return Err(DbForgeError::Config("zero_accuracy must be non-negative".into()));
        }
        if e.max_concurrency == 0 {
            return Err(DbForgeError::Config("max_concurrency must be at least 1".into()));
        }
        if e.timeout_secs == 0 {
            return Err(DbForgeError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
