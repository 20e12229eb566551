use serde::{Deserialize, Serialize};

/// A text file extracted from the source archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Archive path with the configured prefix removed.
    #[serde(rename = "filename")]
    pub id: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Documents in archive traversal order.
///
/// Two archive entries may normalize to the same id; both are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub const fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub fn total_bytes(&self) -> usize {
        self.documents.iter().map(|d| d.content.len()).sum()
    }
}

impl FromIterator<Document> for DocumentCollection {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DocumentCollection {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a DocumentCollection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
