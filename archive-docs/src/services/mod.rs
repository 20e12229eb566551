pub mod corpus;
pub mod extractor;
pub mod fetcher;
pub mod http;
pub mod query;

pub use corpus::{CacheStatus, CorpusCache};
pub use extractor::CorpusExtractor;
pub use fetcher::{ArchiveFetcher, is_valid_archive, is_zip};
pub use http::HttpDownloader;
pub use query::QueryService;
