mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use std::process;

use commands::comparison::{PortfolioArgs, RentVsBuyArgs, TaxHarvestArgs};
use commands::loans::{AmortizationArgs, EmiArgs};
use commands::savings::{GoalArgs, LumpSumArgs, RecurringArgs};

/// Personal-finance calculations with decimal precision
#[derive(Parser)]
#[command(
    name = "pfc",
    version,
    about = "Personal-finance calculations with decimal precision",
    long_about = "A CLI for everyday money decisions computed in 128-bit decimal arithmetic. \
                  Supports loan EMIs and amortization with prepayments, fixed-deposit and \
                  recurring-investment growth, goal planning, tax-loss harvesting, \
                  rent-versus-buy and portfolio returns."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Equated monthly instalment for a loan
    Emi(EmiArgs),
    /// Month-by-month amortization schedule, with optional prepayments
    Amortization(AmortizationArgs),
    /// Maturity value of a lump-sum deposit
    LumpSum(LumpSumArgs),
    /// Growth of a recurring monthly investment (SIP / RD)
    Recurring(RecurringArgs),
    /// Monthly saving needed to reach a goal
    Goal(GoalArgs),
    /// Bucket tax lots and net losses against gains
    TaxHarvest(TaxHarvestArgs),
    /// Compare buying a home against renting and investing
    RentVsBuy(RentVsBuyArgs),
    /// Returns and allocation across holdings
    Portfolio(PortfolioArgs),
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

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loans::run_emi(args),
        Commands::Amortization(args) => commands::loans::run_amortization(args),
        Commands::LumpSum(args) => commands::savings::run_lump_sum(args),
        Commands::Recurring(args) => commands::savings::run_recurring(args),
        Commands::Goal(args) => commands::savings::run_goal(args),
        Commands::TaxHarvest(args) => commands::comparison::run_tax_harvest(args),
        Commands::RentVsBuy(args) => commands::comparison::run_rent_vs_buy(args),
        Commands::Portfolio(args) => commands::comparison::run_portfolio(args),
        Commands::Version => {
            println!("pfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
