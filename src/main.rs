use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::error;

mod cmd;
mod logging;
mod reports;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Evolves dangling-bond layouts that implement a truth table",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More output (-v debug, -vv trace).
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors.
    #[arg(global = true, short, long, default_value_t = false)]
    quiet: bool,

    /// Mirror the log into this file.
    #[arg(global = true, long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new evolution.
    Search(cmd::search::SearchArgs),
    /// Continue an evolution from its checkpoint.
    Resume(cmd::resume::ResumeArgs),
    /// Re-check a checkpoint's best individuals and export the accurate ones.
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    // Raw matches tell user input apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone()) {
        eprintln!("Failed to set up logging: {}", e);
        process::exit(1);
    }

    let result = match &cli.command {
        Commands::Search(args) => cmd::search::run(args, matches.subcommand_matches("search")),
        Commands::Resume(args) => cmd::resume::run(args),
        Commands::Validate(args) => cmd::validate::run(args),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
