use std::sync::Arc;

use tracing::debug;

use crate::domain::{DEFAULT_LIMIT, DocMatch, SearchHit, SearchQuery};
use crate::error::Result;
use crate::ports::{ArchiveDownloader, SearchIndex};
use crate::services::CorpusCache;

/// Read-only search entry point for the CLI and the MCP server.
pub struct QueryService<D: ArchiveDownloader> {
    cache: Arc<CorpusCache<D>>,
    default_limit: usize,
}

impl<D: ArchiveDownloader> QueryService<D> {
    pub const fn new(cache: Arc<CorpusCache<D>>) -> Self {
        Self {
            cache,
            default_limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn cache(&self) -> &CorpusCache<D> {
        &self.cache
    }

    /// Fails with the initialization error when the corpus cannot be built.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let index = self.cache.ensure_ready().await?;
        let hits = index.search(query);
        debug!(query = %query.query, limit = query.limit, hits = hits.len(), "Search complete");
        Ok(hits)
    }

    /// The tool-facing contract: filename and content, best match first.
    pub async fn search_docs(
        &self,
        query: &str,
        num_results: Option<usize>,
    ) -> Result<Vec<DocMatch>> {
        let limit = num_results.unwrap_or(self.default_limit);
        let query = SearchQuery::new(query).with_limit(limit);
        let hits = self.search(&query).await?;
        Ok(hits.into_iter().map(DocMatch::from).collect())
    }
}
