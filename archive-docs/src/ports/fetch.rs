use async_trait::async_trait;

use crate::error::Result;

/// Transport that pulls the raw archive bytes for a URL.
///
/// Implementations report failures as `ArchiveDocsError::Fetch` and never
/// return a partial body.
#[async_trait]
pub trait ArchiveDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
