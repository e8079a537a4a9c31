use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::{EnvFilter, fmt::Subscriber};

mod aggregator;
mod extractor;
mod fetcher;
mod loader;
mod models;
mod report;

#[derive(Parser, Debug)]
#[command(name = "safe-fee-extract", version)]
struct Cli {
    /// CSV of safe addresses; header row first, address in the first column
    #[arg(long, env = "SAFES_CSV", default_value = "safes.csv")]
    safes: PathBuf,

    /// Per-transaction report
    #[arg(long, env = "DETAIL_CSV", default_value = "detailedTransactions.csv")]
    detail_out: PathBuf,

    /// Per-executor fee totals
    #[arg(long, env = "SUMMARY_CSV", default_value = "executorSummary.csv")]
    summary_out: PathBuf,

    /// Safe Transaction Service base URL
    #[arg(long, env = "SAFE_API_URL", default_value = fetcher::DEFAULT_API_URL)]
    api_url: String,

    /// Optional bearer token for the transaction service
    #[arg(long, env = "SAFE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Results requested per page
    #[arg(long, env = "PAGE_SIZE", default_value_t = 100)]
    page_size: u32,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every safe's history and write both reports
    Run,
    /// Validate the safes file and print the checksummed addresses
    Check,
    /// Print the headers of both reports
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for `check` / `schema` output
    Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let source = fetcher::SafeTxService::new(&cli.api_url, cli.api_key.as_deref(), cli.page_size)?;
            let reports = report::ReportPaths {
                detail: cli.detail_out,
                summary: cli.summary_out,
            };
            extractor::run(&source, &cli.safes, &reports).await?;
        }
        Commands::Check => {
            let loaded = loader::load_safes(&cli.safes)?;
            for addr in &loaded.addresses {
                println!("{addr}");
            }
        }
        Commands::Schema => {
            println!("{}", report::DETAIL_HEADER.join(","));
            println!("{}", report::SUMMARY_HEADER.join(","));
        }
    }

    Ok(())
}
