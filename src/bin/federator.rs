//! CLI binary for federator.

use clap::Parser;
use federated_search::FederatedSearch;
use federator::Cli;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON result, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("federator=info,federated_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?.to_search_config()?;

    let mut search = FederatedSearch::new(config)?;
    let result = search.search().await?;

    let failed = result.sources.iter().filter(|s| !s.status.is_ok()).count();
    info!(
        total = result.total,
        results = result.results.len(),
        sources = result.sources.len(),
        failed,
        "search complete"
    );

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}
