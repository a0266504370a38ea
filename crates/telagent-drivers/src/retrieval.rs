// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Business knowledge base retrieval (C5's `search_knowledge_base` tool
//! calls through this port). Kept deliberately narrow — a query in, ranked
//! snippets out — so a future embedding-backed implementation can replace
//! the in-memory keyword version without touching the tool handler.

use async_trait::async_trait;

use crate::DriverError;

#[derive(Debug, Clone)]
pub struct KnowledgeSnippet {
    pub title: String,
    pub text: String,
}

#[async_trait]
pub trait RetrievalDriver: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<KnowledgeSnippet>, DriverError>;
}

/// In-memory keyword search over a fixed snippet set, loaded once from a
/// business's registry entry at startup. Case-insensitive substring match,
/// ranked by match count — good enough for per-business FAQ documents that
/// rarely exceed a few dozen entries.
pub struct StaticRetrievalDriver {
    snippets: Vec<KnowledgeSnippet>,
}

impl StaticRetrievalDriver {
    pub fn new(snippets: Vec<KnowledgeSnippet>) -> Self {
        Self { snippets }
    }
}

#[async_trait]
impl RetrievalDriver for StaticRetrievalDriver {
    async fn search(&self, query: &str) -> Result<Vec<KnowledgeSnippet>, DriverError> {
        let q = query.to_lowercase();
        let mut scored: Vec<(usize, &KnowledgeSnippet)> = self
            .snippets
            .iter()
            .filter_map(|s| {
                let count = s.text.to_lowercase().matches(&q).count()
                    + s.title.to_lowercase().matches(&q).count();
                (count > 0).then_some((count, s))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, s)| s.clone()).collect())
    }
}
