//! # archive-docs
//!
//! Full-text search over the documentation files inside a remote source
//! archive. The archive is downloaded once into a local cache, its text files
//! are extracted, and a TF-IDF index is built in memory on first use.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use archive_docs::config::Config;
//! use archive_docs::services::{CorpusCache, HttpDownloader, QueryService};
//!
//! # async fn run() -> archive_docs::Result<()> {
//! let config = Config::load()?;
//! let downloader = Arc::new(HttpDownloader::new(&config.fetch)?);
//! let cache = Arc::new(CorpusCache::new(config.source.clone(), downloader)?);
//! let service = QueryService::new(cache);
//!
//! for doc in service.search_docs("getting started", Some(5)).await? {
//!     println!("{}", doc.filename);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod mcp;
pub mod ports;
pub mod services;

pub use error::{ArchiveDocsError, FetchFailure, Result};
