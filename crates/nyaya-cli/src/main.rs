//! Nyaya CLI - Command-line interface for the Nyaya compliance engine.

use clap::Parser;
use nyaya_cli::commands;
use nyaya_cli::{Cli, Command, Config, Context, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nyaya=info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> nyaya_cli::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let context = Context::new(&cli, &config)?;

    match cli.command {
        Command::Analyze(args) => commands::execute_analyze(args, &context, &formatter).await?,
        Command::Validate => commands::execute_validate(&context, &formatter)?,
        Command::Neighbors(args) => commands::execute_neighbors(args, &context, &formatter)?,
        Command::Search(args) => commands::execute_search(args, &context, &formatter).await?,
        Command::Classify(args) => commands::execute_classify(args, &context, &formatter).await?,
    }

    Ok(())
}
