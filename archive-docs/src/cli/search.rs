use serde_json::json;

use archive_docs::Result;
use archive_docs::config::Config;
use archive_docs::domain::SearchQuery;
use archive_docs::services::{HttpDownloader, QueryService};

use super::print_json;

pub async fn run(
    service: &QueryService<HttpDownloader>,
    config: &Config,
    query: &str,
    limit: Option<usize>,
    filename: Option<String>,
    json: bool,
) -> Result<()> {
    let mut search = SearchQuery::new(query).with_limit(limit.unwrap_or(service.default_limit()));
    if let Some(filename) = filename {
        search = search.with_filename(filename);
    }

    let hits = service.search(&search).await?;

    if json {
        return print_json(&json!({
            "query": query,
            "count": hits.len(),
            "results": hits,
        }));
    }

    let rule = "=".repeat(80);
    println!("\nSearching for: '{query}'");
    println!("{rule}\n");

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s):\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!("{rule}");
        println!("Result {}: {} (score: {:.3})", i + 1, hit.document_id, hit.score);
        println!("{rule}");
        println!("{}\n", preview(&hit.content, config.search.preview_chars));
    }
    Ok(())
}

/// First `max_chars` characters, trimmed, with a trailing `...` line when cut.
fn preview(content: &str, max_chars: usize) -> String {
    let head: String = content.chars().take(max_chars).collect();
    let mut preview = head.trim().to_string();
    if content.chars().nth(max_chars).is_some() {
        preview.push_str("\n...");
    }
    preview
}
