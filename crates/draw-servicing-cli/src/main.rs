mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::amortization::{AmortizeArgs, ApplyPaymentArgs};
use commands::assistant::{CatalogArgs, DispatchArgs};
use commands::risk::RiskScoreArgs;
use config::Config;

/// Construction-loan draw servicing calculations
#[derive(Parser)]
#[command(
    name = "drawctl",
    version,
    about = "Construction-loan draw servicing calculations",
    long_about = "A CLI for the draw servicing core: draw risk scoring, \
                  amortization schedules, payment application, and the \
                  assistant function catalog and dispatcher."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a draw request (0-100, lower is riskier)
    RiskScore(RiskScoreArgs),
    /// Generate a monthly amortization schedule
    Amortize(AmortizeArgs),
    /// Split a payment into interest and principal
    ApplyPayment(ApplyPaymentArgs),
    /// Print the assistant function catalog
    Catalog(CatalogArgs),
    /// Dispatch a model decision against fixture rows
    Dispatch(DispatchArgs),
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

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    init_tracing(&config.log_level);
    config.source.log();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::RiskScore(args) => commands::risk::run_risk_score(args, &config.risk_policy),
        Commands::Amortize(args) => commands::amortization::run_amortize(args),
        Commands::ApplyPayment(args) => commands::amortization::run_apply_payment(args),
        Commands::Catalog(args) => commands::assistant::run_catalog(args, &config.assistant),
        Commands::Dispatch(args) => commands::assistant::run_dispatch(args, &config.assistant),
        Commands::Version => {
            println!("drawctl {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
