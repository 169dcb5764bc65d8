use clap::{Parser, Subcommand};
use currency_rates::{
    config::Overrides,
    convert::{self, DEFAULT_BASE},
    CacheStore, Config, FileBackend, RateError, RateFetcher,
};
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "currency_rates", version, about = "Convert between currencies using cached exchange rates")]
struct Cli {
    /// Rates API base URL (overrides RATES_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the rates cache (overrides RATES_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Request timeout in seconds (overrides RATES_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an amount from one currency to another
    Convert {
        from: String,
        to: String,
        amount: f64,
    },
    /// List exchange rates for a base currency
    List {
        #[arg(default_value = DEFAULT_BASE)]
        base: String,
    },
    /// List supported currency codes
    Codes,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        api_url: cli.api_url,
        cache_dir: cli.cache_dir,
        timeout_secs: cli.timeout_secs,
    };
    let config = match Config::from_env_with(overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cache = CacheStore::new(Arc::new(FileBackend::new(&config.cache_dir)));
    let fetcher = RateFetcher::from_config(&config, cache);

    let outcome = match cli.command {
        Command::Convert { from, to, amount } => convert::convert(&fetcher, amount, &from, &to)
            .await
            .map(|conversion| println!("{}", conversion)),
        Command::List { base } => fetcher.fetch_rates(&base).await.map(|rates| {
            let mut rates: Vec<_> = rates.rates.into_iter().collect();
            rates.sort_by(|a, b| a.0.cmp(&b.0));
            println!("Exchange rates for {}:", base);
            for (currency, rate) in rates {
                println!("{}: {}", currency, rate);
            }
        }),
        Command::Codes => convert::currency_codes(&fetcher, DEFAULT_BASE)
            .await
            .map(|codes| println!("{}", codes.join(" "))),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn describe(err: &RateError) -> String {
    match err {
        RateError::Timeout => "Request timed out. Try again.".to_string(),
        RateError::InvalidAmount(_) => "Please enter a valid amount".to_string(),
        other => format!("Error fetching rates: {}", other),
    }
}
