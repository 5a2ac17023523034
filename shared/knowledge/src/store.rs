use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::tokenizer::tokenize;

/// Retrieval store of previously seen report texts.
pub trait KnowledgeStore: Send + Sync {
    /// Append a document. Blank documents are ignored.
    fn add(&self, document: &str);

    /// Up to `top_k` stored documents ranked by shared-token count.
    fn query(&self, text: &str, top_k: usize) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct IndexedDocument {
    text: String,
    tokens: HashSet<String>,
}

/// Process-lifetime store kept in insertion order.
pub struct InMemoryKnowledgeStore {
    documents: Mutex<VecDeque<IndexedDocument>>,
    max_documents: Option<usize>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(VecDeque::new()),
            max_documents: None,
        }
    }

    /// Keep at most `max_documents`, evicting the oldest first.
    pub fn with_capacity_limit(mut self, max_documents: usize) -> Self {
        self.max_documents = Some(max_documents.max(1));
        self
    }

    pub fn max_documents(&self) -> Option<usize> {
        self.max_documents
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn documents(&self) -> MutexGuard<'_, VecDeque<IndexedDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore for InMemoryKnowledgeStore {
    fn add(&self, document: &str) {
        if document.trim().is_empty() {
            return;
        }

        let indexed = IndexedDocument {
            text: document.to_string(),
            tokens: tokenize(document),
        };

        let mut documents = self.documents();
        documents.push_back(indexed);

        if let Some(limit) = self.max_documents {
            while documents.len() > limit {
                documents.pop_front();
                warn!(limit, "Knowledge store full, evicted oldest document");
            }
        }

        debug!(documents = documents.len(), "Document added to knowledge store");
    }

    fn query(&self, text: &str, top_k: usize) -> Vec<String> {
        if top_k == 0 {
            return Vec::new();
        }

        let query_tokens = tokenize(text);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let documents = self.documents();
        let mut scored: Vec<(usize, &IndexedDocument)> = documents
            .iter()
            .map(|doc| (doc.tokens.intersection(&query_tokens).count(), doc))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(top_k)
            .map(|(_, doc)| doc.text.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.documents().len()
    }
}
