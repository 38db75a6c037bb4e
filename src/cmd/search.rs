use super::{new_run_id, SimulatorArgs};
use crate::reports;
use clap::{ArgMatches, Args};
use dbforge::config::{parse_key_val, Config};
use dbforge::error::DfResult;
use dbforge::geometry::LayoutFile;
use dbforge::optimizer::runner::{Evolution, RunSettings};
use dbforge::truth::TruthTable;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Layout file (JSON list of dots).
    pub layout: PathBuf,

    /// Truth table (JSON rows or CSV with in*/out* columns).
    #[arg(short = 't', long)]
    pub truth_table: PathBuf,

    /// Options file; flags given on the command line win over it.
    #[arg(short = 'o', long)]
    pub options: Option<PathBuf>,

    #[arg(short = 'n', long, default_value_t = 30)]
    pub generations: usize,

    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(short = 'S', long)]
    pub seed: Option<String>,

    /// Simulator parameter override, repeatable.
    #[arg(long = "sim-param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub sim_params: Vec<(String, String)>,

    #[command(flatten)]
    pub simulator: SimulatorArgs,

    #[command(flatten)]
    pub config: Config,
}

/// Options file (if any) as the base, explicit flags on top.
pub fn resolve_config(args: &SearchArgs, matches: Option<&ArgMatches>) -> DfResult<Config> {
    let mut config = match &args.options {
        Some(path) => {
            let mut base = Config::load_from_file(path)?;
            if let Some(m) = matches {
                base.merge_from_cli(&args.config, m);
            }
            base
        }
        None => args.config.clone(),
    };
    for (k, v) in &args.sim_params {
        config.simulation_parameters.0.insert(k.clone(), v.clone());
    }
    config.validate()?;
    Ok(config)
}

pub fn run(args: &SearchArgs, matches: Option<&ArgMatches>) -> DfResult<()> {
    let config = resolve_config(args, matches)?;
    let table = TruthTable::load_from_file(&args.truth_table)?;
    let layout_file = LayoutFile::open(&args.layout)?;
    let oracle = args.simulator.oracle(config.evaluation.timeout_secs);

    let settings = RunSettings {
        run_id: new_run_id(args.prefix.as_deref()),
        seed: args.seed.clone(),
        runs_dir: args.simulator.runs_dir.clone(),
    };

    info!("Process PID: {}", std::process::id());
    let mut evolution = Evolution::start(config, table, layout_file, oracle, settings)?;
    reports::print_run_header(evolution.state());

    evolution.run(args.generations, &reports::ConsoleProgress)?;
    reports::print_run_footer(&evolution);
    Ok(())
}
