mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::concentration::ConcentrationArgs;
use commands::narrative::NarrativeArgs;
use commands::opportunity::OpportunityArgs;
use commands::signals::SignalsArgs;
use commands::white_space::WhiteSpaceArgs;

/// Market structure analytics
#[derive(Parser)]
#[command(
    name = "mlens",
    version,
    about = "Market concentration, white-space and opportunity analysis",
    long_about = "A CLI for analysing market structure from tabular sales or purchase data \
                  with decimal precision. Supports entity concentration, white-space \
                  detection, opportunity priority scoring, market signals and \
                  plain-language narratives."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Concentration report and distribution for one entity dimension
    Concentration(ConcentrationArgs),
    /// Per-grouping volume vs. the target entity's captured share
    WhiteSpace(WhiteSpaceArgs),
    /// Rank groupings or entities by impact, feasibility and efficiency
    Opportunity(OpportunityArgs),
    /// Time trend, price against volume and structure mix
    Signals(SignalsArgs),
    /// Compose the seven-section market narrative
    Narrative(NarrativeArgs),
    /// Run the full analysis from a configuration file and/or flags
    Analyze(AnalyzeArgs),
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

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Concentration(args) => commands::concentration::run_concentration(args),
        Commands::WhiteSpace(args) => commands::white_space::run_white_space(args),
        Commands::Opportunity(args) => commands::opportunity::run_opportunity(args),
        Commands::Signals(args) => commands::signals::run_signals(args),
        Commands::Narrative(args) => commands::narrative::run_narrative(args),
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Version => {
            println!("mlens {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
