// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `transfer_to_human`: emergency/escalation handoff (§4.3, C5). Only
//! reachable when the business enables `feature_flags.emergency_enabled`
//! and has an `emergency_transfer_number` configured — otherwise the model
//! is told to apologize and take a message instead.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use telagent_drivers::CallRedirectHook;

use crate::tool::{Tool, ToolCall, ToolContext, ToolOutput};

#[derive(Deserialize)]
struct Args {
    reason: String,
}

pub struct TransferToHumanTool {
    hook: Arc<dyn CallRedirectHook>,
}

impl TransferToHumanTool {
    pub fn new(hook: Arc<dyn CallRedirectHook>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl Tool for TransferToHumanTool {
    fn name(&self) -> &str {
        "transfer_to_human"
    }

    fn description(&self) -> &str {
        "Transfer the active call to a human for an emergency or a request the agent cannot handle."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": { "type": "string", "description": "Why the call needs a human." }
            },
            "required": ["reason"]
        })
    }

    async fn execute(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> ToolOutput {
        if !ctx.business.feature_flags.emergency_enabled {
            return ToolOutput::err(&call.id, "call transfer is not enabled for this business");
        }
        let Some(target) = ctx.business.emergency_transfer_number.clone() else {
            return ToolOutput::err(&call.id, "no emergency transfer number is configured");
        };
        let args: Args = match serde_json::from_value(call.args.clone()) {
            Ok(a) => a,
            Err(e) => return ToolOutput::err(&call.id, format!("invalid arguments: {e}")),
        };
        let call_id = ctx.session.id.to_string();
        match self.hook.redirect(&call_id, &target).await {
            Ok(()) => {
                ctx.session.append_history("system", format!("transferred to human: {}", args.reason));
                ToolOutput::ok(&call.id, "Transferring you now, please hold.")
            }
            Err(e) => ToolOutput::err(&call.id, format!("transfer failed: {e}")),
        }
    }
}
