//! # Care Planner Knowledge Store
//!
//! Keyword-overlap retrieval over report texts seen earlier in the process.
//! Documents and queries are reduced to sets of lowercase word tokens and
//! ranked by the size of their intersection.

pub mod store;
pub mod tokenizer;

pub use store::{InMemoryKnowledgeStore, KnowledgeStore};
pub use tokenizer::tokenize;
