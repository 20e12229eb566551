pub mod tfidf;
pub mod tokenizer;

pub use tfidf::TfIdfIndex;
pub use tokenizer::tokenize;
