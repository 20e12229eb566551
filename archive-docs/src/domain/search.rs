use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Exact match on the document filename.
    pub filename: Option<String>,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filename: None,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "filename")]
    pub document_id: String,
    pub content: String,
    pub score: f32,
}

/// The shape handed to tool callers: no scores, no index internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMatch {
    pub filename: String,
    pub content: String,
}

impl From<SearchHit> for DocMatch {
    fn from(hit: SearchHit) -> Self {
        Self {
            filename: hit.document_id,
            content: hit.content,
        }
    }
}
