// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The model-facing [`Tool`] trait (§4.5) and its call/output envelopes.
//!
//! Unlike an editor agent's tools, every tool here runs against one call's
//! [`telagent_core::Session`] plus its business's static configuration —
//! there is no approval workflow or output-mode filtering, since a voice
//! call has no human in the loop to ask and no context window to budget.

use async_trait::async_trait;
use serde_json::Value;
use telagent_config::BusinessConfig;
use telagent_core::Session;

#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: content.into(), is_error: false }
    }

    pub fn err(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: content.into(), is_error: true }
    }
}

/// Everything a tool needs beyond its own arguments: the call's mutable
/// conversational state and the owning business's static configuration.
/// Borrowed rather than owned so the per-call actor task keeps authority
/// over the [`Session`] between tool invocations.
pub struct ToolContext<'a> {
    pub session: &'a mut Session,
    pub business: &'a BusinessConfig,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> ToolOutput;
}
