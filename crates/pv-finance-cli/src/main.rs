mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::solar::{CeilingArgs, CompareArgs, EvaluateArgs, ScheduleArgs};

/// Rooftop solar project-finance evaluation
#[derive(Parser)]
#[command(
    name = "pvf",
    version,
    about = "Rooftop solar project-finance evaluation",
    long_about = "Builds the 25-year pro-forma for a C&I rooftop solar plant with decimal \
                  precision and reports project IRR, equity IRR, minimum DSCR, the pricing \
                  ceiling for a target IRR, and investment-weighted scheme comparisons."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace). Overrides PVF_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a plant: schedule, project/equity IRR and minimum DSCR
    Evaluate(EvaluateArgs),
    /// Print the 25-year cash-flow schedule only
    Schedule(ScheduleArgs),
    /// Maximum system cost and development fee for the target project IRR
    Ceiling(CeilingArgs),
    /// Compare candidate schemes and aggregate them by investment
    Compare(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level.as_deref()) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::solar::run_evaluate(args),
        Commands::Schedule(args) => commands::solar::run_schedule(args),
        Commands::Ceiling(args) => commands::solar::run_ceiling(args),
        Commands::Compare(args) => commands::solar::run_compare(args),
        Commands::Version => {
            println!("pvf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
