use std::path::{Path, PathBuf};

/// A cached archive that passed the structural zip check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// blake3 of the archive bytes, hex encoded.
    pub digest: String,
}

impl ArchiveHandle {
    pub fn new(path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            size_bytes: bytes.len() as u64,
            digest: hex::encode(blake3::hash(bytes).as_bytes()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }
}
