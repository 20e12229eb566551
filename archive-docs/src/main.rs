use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() {
    // stdout carries results and MCP traffic; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("archive_docs=info")),
        )
        .try_init()
        .ok();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
