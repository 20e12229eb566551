use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ArchiveHandle;
use crate::error::{ArchiveDocsError, Result};
use crate::ports::ArchiveDownloader;

/// True when the bytes carry a readable zip central directory.
pub fn is_zip(bytes: &[u8]) -> bool {
    zip::ZipArchive::new(Cursor::new(bytes)).is_ok()
}

/// Same structural check as [`is_zip`], against a file on disk.
pub fn is_valid_archive(path: &Path) -> bool {
    std::fs::File::open(path)
        .map(|file| zip::ZipArchive::new(io::BufReader::new(file)).is_ok())
        .unwrap_or(false)
}

/// Keeps one validated copy of the source archive at a cache path.
pub struct ArchiveFetcher<D: ArchiveDownloader> {
    downloader: Arc<D>,
}

impl<D: ArchiveDownloader> ArchiveFetcher<D> {
    pub const fn new(downloader: Arc<D>) -> Self {
        Self { downloader }
    }

    pub async fn fetch(&self, url: &str, cache_path: &Path) -> Result<ArchiveHandle> {
        if let Some(handle) = Self::cached(cache_path).await? {
            return Ok(handle);
        }

        info!(url, "Downloading archive");
        let body = self.downloader.download(url).await?;
        let handle = Self::persist(cache_path, &body).await?;

        info!(
            bytes = handle.size_bytes,
            path = %handle.path.display(),
            digest = handle.short_digest(),
            "Downloaded archive"
        );
        Ok(handle)
    }

    async fn cached(path: &Path) -> Result<Option<ArchiveHandle>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if is_zip(&bytes) {
            info!(path = %path.display(), "Using cached archive");
            return Ok(Some(ArchiveHandle::new(path, &bytes)));
        }

        warn!(path = %path.display(), "Cached archive is corrupted, re-downloading");
        tokio::fs::remove_file(path).await?;
        Ok(None)
    }

    /// Writes next to the cache path, re-reads and validates what landed on
    /// disk, then moves it into place. Nothing is left behind on failure.
    async fn persist(cache_path: &Path, body: &[u8]) -> Result<ArchiveHandle> {
        if let Some(parent) = cache_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(cache_path);
        let result = Self::write_validated(&partial, cache_path, body).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
        }
        result
    }

    async fn write_validated(
        partial: &Path,
        cache_path: &Path,
        body: &[u8],
    ) -> Result<ArchiveHandle> {
        tokio::fs::write(partial, body).await?;

        let written = tokio::fs::read(partial).await?;
        if !is_zip(&written) {
            warn!(
                path = %cache_path.display(),
                bytes = written.len(),
                "Downloaded file is not a valid zip"
            );
            return Err(ArchiveDocsError::CorruptDownload(cache_path.to_path_buf()));
        }

        tokio::fs::rename(partial, cache_path).await?;
        Ok(ArchiveHandle::new(cache_path, &written))
    }
}

fn partial_path(cache_path: &Path) -> PathBuf {
    let mut name = cache_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".part");
    cache_path.with_file_name(name)
}
