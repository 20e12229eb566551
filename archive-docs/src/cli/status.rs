use serde_json::json;

use archive_docs::Result;
use archive_docs::config::Config;
use archive_docs::services::is_valid_archive;

use super::print_json;

pub fn run(config: &Config, json: bool) -> Result<()> {
    let source = &config.source;
    let size_bytes = std::fs::metadata(&source.cache_path)
        .ok()
        .map(|m| m.len());
    let valid = size_bytes.is_some() && is_valid_archive(&source.cache_path);

    if json {
        return print_json(&json!({
            "url": source.url,
            "cache_path": source.cache_path,
            "cached": size_bytes.is_some(),
            "valid": valid,
            "size_bytes": size_bytes,
            "strip_prefix": source.strip_prefix,
            "extensions": source.extensions,
            "timeout_secs": config.fetch.timeout_secs,
        }));
    }

    println!("Source:     {}", source.url);
    println!("Cache:      {}", source.cache_path.display());
    match size_bytes {
        Some(size) if valid => println!("Archive:    valid zip, {size} bytes"),
        Some(size) => println!("Archive:    corrupted ({size} bytes), will re-download"),
        None => println!("Archive:    not downloaded"),
    }
    println!("Prefix:     {}", source.strip_prefix);
    println!("Extensions: {}", source.extensions.join(", "));
    Ok(())
}
