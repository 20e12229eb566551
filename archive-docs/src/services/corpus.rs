use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::SourceConfig;
use crate::error::{ArchiveDocsError, Result};
use crate::index::TfIdfIndex;
use crate::ports::{ArchiveDownloader, SearchIndex};
use crate::services::{ArchiveFetcher, CorpusExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheStatus {
    Uninitialized,
    Initializing,
    Ready { documents: usize },
}

/// Owns the fetch → extract → build pipeline and the index it produces.
///
/// At most one pipeline run is in flight per cache. Callers arriving during a
/// run wait for it; a failed run leaves the cache uninitialized so the next
/// caller starts over.
pub struct CorpusCache<D: ArchiveDownloader> {
    source: SourceConfig,
    fetcher: ArchiveFetcher<D>,
    extractor: Arc<CorpusExtractor>,
    index: OnceCell<Arc<TfIdfIndex>>,
    initializing: AtomicBool,
}

impl<D: ArchiveDownloader> CorpusCache<D> {
    pub fn new(source: SourceConfig, downloader: Arc<D>) -> Result<Self> {
        let extractor = CorpusExtractor::from_config(&source)?;
        Ok(Self {
            source,
            fetcher: ArchiveFetcher::new(downloader),
            extractor: Arc::new(extractor),
            index: OnceCell::new(),
            initializing: AtomicBool::new(false),
        })
    }

    pub async fn ensure_ready(&self) -> Result<Arc<TfIdfIndex>> {
        self.index
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    /// Builds the index ahead of the first query.
    pub async fn warm(&self) -> Result<usize> {
        Ok(self.ensure_ready().await?.len())
    }

    pub fn status(&self) -> CacheStatus {
        if let Some(index) = self.index.get() {
            CacheStatus::Ready {
                documents: index.len(),
            }
        } else if self.initializing.load(Ordering::SeqCst) {
            CacheStatus::Initializing
        } else {
            CacheStatus::Uninitialized
        }
    }

    async fn initialize(&self) -> Result<Arc<TfIdfIndex>> {
        let _flag = InitializingFlag::raise(&self.initializing);
        info!(url = %self.source.url, "Initializing search index");

        let handle = self
            .fetcher
            .fetch(&self.source.url, &self.source.cache_path)
            .await?;

        let extractor = Arc::clone(&self.extractor);
        let index = tokio::task::spawn_blocking(move || -> Result<TfIdfIndex> {
            let documents = extractor.extract(&handle)?;
            info!(
                documents = documents.len(),
                bytes = documents.total_bytes(),
                "Creating search index"
            );
            Ok(TfIdfIndex::build(documents))
        })
        .await
        .map_err(|e| ArchiveDocsError::Io(std::io::Error::other(e)))??;

        info!(
            documents = index.len(),
            vocabulary = index.vocabulary_size(),
            "Index initialization complete"
        );
        Ok(Arc::new(index))
    }
}

/// Lowers the flag when initialization ends, including when the caller's
/// future is dropped mid-run.
struct InitializingFlag<'a>(&'a AtomicBool);

impl<'a> InitializingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InitializingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
