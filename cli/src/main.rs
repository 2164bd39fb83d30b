//! RateCalc CLI
//!
//! Fetches exchange rates and converts amounts from the terminal, driving
//! one converter session per invocation.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratecalc_fx::{CurrencyApiProvider, ProviderConfig};
use ratecalc_session::{ConverterSession, SessionConfig};

mod commands;

/// RateCalc currency converter
#[derive(Parser, Debug)]
#[command(name = "ratecalc")]
#[command(about = "Convert amounts using live exchange rates")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Override the rates API URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an amount between two currencies
    Convert {
        /// Amount, with '.' as the decimal separator
        amount: String,

        /// Currency the amount is in
        #[arg(short, long)]
        from: Option<String>,

        /// Currency to convert into
        #[arg(short, long)]
        to: Option<String>,

        /// Print the full session view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show rates against a base currency
    Rates {
        /// Base currency
        #[arg(short, long)]
        base: Option<String>,

        /// Comma-separated targets (all currencies when omitted)
        #[arg(short, long, value_delimiter = ',')]
        targets: Vec<String>,
    },

    /// List all available currency codes
    Currencies,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    // Load configuration
    let mut provider_config = ProviderConfig::from_env();
    if let Some(url) = args.api_url.clone() {
        provider_config.base_url = url;
    }
    if let Err(e) = provider_config.validate() {
        error!(error = %e, "Invalid provider configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let session_config = SessionConfig::from_env();
    let default_base = session_config.default_base.to_string();
    let default_target = session_config.default_target.to_string();

    let provider = Arc::new(CurrencyApiProvider::new(provider_config)?);
    let session = ConverterSession::new(provider, session_config)?;

    info!(command = ?args.command, "Running command");

    let output = match &args.command {
        Command::Convert {
            amount,
            from,
            to,
            json,
        } => {
            let from = from.as_deref().unwrap_or(&default_base);
            let to = to.as_deref().unwrap_or(&default_target);
            commands::convert(&session, amount, from, to, *json).await?
        }
        Command::Rates { base, targets } => {
            let base = base.as_deref().unwrap_or(&default_base);
            commands::rates(&session, base, targets).await?
        }
        Command::Currencies => commands::currencies(&session).await?,
    };

    println!("{output}");
    Ok(())
}
