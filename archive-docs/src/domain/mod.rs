pub mod archive;
pub mod document;
pub mod search;

pub use archive::ArchiveHandle;
pub use document::{Document, DocumentCollection};
pub use search::{DEFAULT_LIMIT, DocMatch, SearchHit, SearchQuery};
