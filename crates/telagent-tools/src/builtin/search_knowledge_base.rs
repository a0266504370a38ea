// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `search_knowledge_base`: answers caller questions from a business's FAQ
//! snippets (§4.5, C5). Gated by `feature_flags.rag_enabled` so a business
//! that hasn't populated a knowledge base never advertises the tool as
//! useful busywork to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use telagent_drivers::RetrievalDriver;

use crate::tool::{Tool, ToolCall, ToolContext, ToolOutput};

#[derive(Deserialize)]
struct Args {
    query: String,
}

pub struct SearchKnowledgeBaseTool {
    retrieval: Arc<dyn RetrievalDriver>,
}

impl SearchKnowledgeBaseTool {
    pub fn new(retrieval: Arc<dyn RetrievalDriver>) -> Self {
        Self { retrieval }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search this business's knowledge base for an answer to the caller's question."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The caller's question, in their own words." }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> ToolOutput {
        if !ctx.business.feature_flags.rag_enabled {
            return ToolOutput::err(&call.id, "knowledge base search is disabled for this business");
        }
        let args: Args = match serde_json::from_value(call.args.clone()) {
            Ok(a) => a,
            Err(e) => return ToolOutput::err(&call.id, format!("invalid arguments: {e}")),
        };
        match self.retrieval.search(&args.query).await {
            Ok(snippets) if snippets.is_empty() => {
                ToolOutput::ok(&call.id, "No matching information was found in the knowledge base.")
            }
            Ok(snippets) => {
                let body = snippets
                    .iter()
                    .take(3)
                    .map(|s| format!("{}: {}", s.title, s.text))
                    .collect::<Vec<_>>()
                    .join("\n");
                ToolOutput::ok(&call.id, body)
            }
            Err(e) => ToolOutput::err(&call.id, format!("knowledge base search failed: {e}")),
        }
    }
}
