use std::io::{BufReader, Read, Seek};
use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::domain::{ArchiveHandle, Document, DocumentCollection};
use crate::error::{ArchiveDocsError, Result};

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATE: u64 = 1 << 20;

/// Turns a zip archive into documents.
///
/// A bad entry is logged and skipped; only an archive that cannot be opened
/// at all is an error.
#[derive(Debug, Clone)]
pub struct CorpusExtractor {
    suffixes: Vec<String>,
    strip_prefix: String,
    fallback: &'static Encoding,
}

impl CorpusExtractor {
    pub fn new(
        extensions: &[String],
        strip_prefix: impl Into<String>,
        fallback_encoding: &str,
    ) -> Result<Self> {
        let fallback = Encoding::for_label(fallback_encoding.trim().as_bytes())
            .ok_or_else(|| ArchiveDocsError::UnknownEncoding(fallback_encoding.to_string()))?;

        let suffixes = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .collect();

        Ok(Self {
            suffixes,
            strip_prefix: strip_prefix.into(),
            fallback,
        })
    }

    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Self::new(
            &source.extensions,
            source.strip_prefix.as_str(),
            &source.fallback_encoding,
        )
    }

    pub fn extract(&self, handle: &ArchiveHandle) -> Result<DocumentCollection> {
        let file = std::fs::File::open(handle.path())
            .map_err(|e| ArchiveDocsError::archive_read(handle.path(), e))?;
        self.extract_from(BufReader::new(file), handle.path())
    }

    pub fn extract_reader<R: Read + Seek>(&self, reader: R) -> Result<DocumentCollection> {
        self.extract_from(reader, Path::new("<memory>"))
    }

    fn extract_from<R: Read + Seek>(&self, reader: R, origin: &Path) -> Result<DocumentCollection> {
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| ArchiveDocsError::archive_read(origin, e))?;

        let total = archive.len();
        let mut selected = 0usize;
        let mut documents = DocumentCollection::new();

        for i in 0..total {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index = i, error = %e, "Skipping unreadable archive entry");
                    continue;
                }
            };

            let name = entry.name().to_string();
            if !self.selects(&name) {
                continue;
            }
            selected += 1;

            let Some(id) = self.normalize(&name) else {
                debug!(entry = %name, "Skipping entry with empty name after prefix removal");
                continue;
            };

            // The declared size comes from the archive and is untrusted.
            let hint = entry.size().min(MAX_PREALLOCATE);
            let mut bytes = Vec::with_capacity(usize::try_from(hint).unwrap_or(0));
            if let Err(e) = entry.read_to_end(&mut bytes) {
                warn!(entry = %name, error = %e, "Skipping archive entry that could not be read");
                continue;
            }

            let Some(content) = self.decode(&name, bytes) else {
                continue;
            };
            if content.is_empty() {
                debug!(entry = %name, "Skipping empty document");
                continue;
            }

            documents.push(Document::new(id, content));
        }

        info!(
            total,
            selected,
            extracted = documents.len(),
            "Extracted documents from archive"
        );
        Ok(documents)
    }

    fn selects(&self, name: &str) -> bool {
        !name.ends_with('/') && self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    fn normalize<'a>(&self, name: &'a str) -> Option<&'a str> {
        let stripped = name.strip_prefix(self.strip_prefix.as_str()).unwrap_or(name);
        (!stripped.is_empty()).then_some(stripped)
    }

    fn decode(&self, name: &str, bytes: Vec<u8>) -> Option<String> {
        let bytes = match String::from_utf8(bytes) {
            Ok(text) => return Some(text),
            Err(e) => e.into_bytes(),
        };

        if let Some(text) = self
            .fallback
            .decode_without_bom_handling_and_without_replacement(&bytes)
        {
            debug!(entry = name, encoding = self.fallback.name(), "Decoded with fallback encoding");
            return Some(text.into_owned());
        }

        warn!(
            entry = name,
            encoding = self.fallback.name(),
            "Skipping entry that is neither UTF-8 nor valid in the fallback encoding"
        );
        None
    }
}
