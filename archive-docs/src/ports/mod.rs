pub mod fetch;
pub mod search;

pub use fetch::ArchiveDownloader;
pub use search::SearchIndex;
