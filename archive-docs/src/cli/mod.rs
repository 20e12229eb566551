use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use archive_docs::Result;
use archive_docs::config::Config;
use archive_docs::mcp::McpServer;
use archive_docs::services::{CorpusCache, HttpDownloader, QueryService};

mod search;
mod status;

#[derive(Parser)]
#[command(name = "archive-docs")]
#[command(about = "Search the documentation inside a remote source archive")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Config file to use instead of the global and project files"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Search the documentation")]
    Search {
        #[arg(help = "Search query")]
        query: String,

        #[arg(long, help = "Maximum results to return [default: search.default_limit]")]
        limit: Option<usize>,

        #[arg(long, help = "Only match the document with this exact filename")]
        filename: Option<String>,
    },

    #[command(about = "Download the archive and build the index")]
    Warm,

    #[command(about = "Show the configured source and cache state")]
    Status,

    #[command(about = "Start MCP server on stdio")]
    Mcp,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Search {
            query,
            limit,
            filename,
        } => {
            let service = build_service(&config)?;
            search::run(&service, &config, &query, limit, filename, cli.json).await
        }
        Commands::Warm => {
            let service = build_service(&config)?;
            let documents = service.cache().warm().await?;
            if cli.json {
                print_json(&serde_json::json!({
                    "status": service.cache().status(),
                    "documents": documents,
                    "cache_path": config.source.cache_path,
                }))
            } else {
                println!(
                    "Indexed {documents} documents from {}",
                    config.source.cache_path.display()
                );
                Ok(())
            }
        }
        Commands::Status => status::run(&config, cli.json),
        Commands::Mcp => {
            let service = build_service(&config)?;
            McpServer::new(Arc::new(service)).run_stdio().await
        }
    }
}

fn build_service(config: &Config) -> Result<QueryService<HttpDownloader>> {
    let downloader = Arc::new(HttpDownloader::new(&config.fetch)?);
    let cache = CorpusCache::new(config.source.clone(), downloader)?;
    Ok(QueryService::new(Arc::new(cache)).with_default_limit(config.search.default_limit))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
