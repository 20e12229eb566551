use crate::domain::{SearchHit, SearchQuery};

pub trait SearchIndex: Send + Sync {
    fn search(&self, query: &SearchQuery) -> Vec<SearchHit>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
