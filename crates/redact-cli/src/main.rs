mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use redact_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize tracing on stderr so stdout stays clean for --format json
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Preview {
            input,
            matching,
            format,
            highlight,
        } => commands::preview::handle(&input, &matching, format, highlight, &config).await,
        cli::Commands::Redact {
            input,
            output,
            matching,
            format,
        } => commands::redact::handle(&input, output, &matching, format, &config).await,
        cli::Commands::Scan {
            text,
            matching,
            mask,
            format,
        } => commands::scan::handle(text, &matching, mask, format, &config).await,
        cli::Commands::Categories { format } => commands::categories::handle(format),
        cli::Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
