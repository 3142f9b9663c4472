mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::financing::{ConstructionLoanArgs, DebtServiceArgs};
use commands::proforma::{ProFormaArgs, ScenariosArgs};
use commands::returns::{ExitTableArgs, WaterfallArgs};
use commands::revenue::{CarryingArgs, RampArgs, RevenueArgs};

/// Real-estate development pro-forma underwriting
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Real-estate development pro-forma underwriting",
    long_about = "Builds development pro-formas with decimal precision: rent rolls, \
                  lease-up ramps, carrying costs, construction loan sizing, permanent \
                  debt service, exit cap-rate tables and refinance waterfalls."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log each calculation stage to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full pro-forma for a project
    ProForma(ProFormaArgs),
    /// Worst case, base and best case side by side
    Scenarios(ScenariosArgs),
    /// Stabilized revenue of every rent-roll row
    Revenue(RevenueArgs),
    /// Lease-up ramp of one monthly revenue figure
    Ramp(RampArgs),
    /// Monthly-equivalent carrying costs by phase
    Carrying(CarryingArgs),
    /// Size the construction loan
    ConstructionLoan(ConstructionLoanArgs),
    /// Permanent loan debt service before and after refinance
    DebtService(DebtServiceArgs),
    /// Exit sale price across cap rates
    ExitTable(ExitTableArgs),
    /// Split a cash-out refinance across partners
    Waterfall(WaterfallArgs),
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ProForma(args) => commands::proforma::run_pro_forma(args),
        Commands::Scenarios(args) => commands::proforma::run_scenarios(args),
        Commands::Revenue(args) => commands::revenue::run_revenue(args),
        Commands::Ramp(args) => commands::revenue::run_ramp(args),
        Commands::Carrying(args) => commands::revenue::run_carrying(args),
        Commands::ConstructionLoan(args) => commands::financing::run_construction_loan(args),
        Commands::DebtService(args) => commands::financing::run_debt_service(args),
        Commands::ExitTable(args) => commands::returns::run_exit_table(args),
        Commands::Waterfall(args) => commands::returns::run_waterfall(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
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
