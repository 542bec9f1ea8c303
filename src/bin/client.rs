use clap::Parser;
use cotacao::core::config::AppConfig;
use cotacao::core::log::init_logging;
use std::process::ExitCode;

/// Fetches the current USD-BRL quote from the local service and writes the
/// bid to a file
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match AppConfig::resolve(cli.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    cotacao::client::run(&config.client).await
}
