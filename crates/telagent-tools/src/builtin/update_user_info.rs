// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `update_user_info`: records caller identity/reason-for-call fields as the
//! model elicits them during the CollectingIdentity phase (§3, §4.5). Only
//! fields present in the call are overwritten — omitted fields keep their
//! previously collected value.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCall, ToolContext, ToolOutput};

#[derive(Deserialize, Default)]
struct Args {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    reason: Option<String>,
    urgency: Option<String>,
}

#[derive(Default)]
pub struct UpdateUserInfoTool;

#[async_trait]
impl Tool for UpdateUserInfoTool {
    fn name(&self) -> &str {
        "update_user_info"
    }

    fn description(&self) -> &str {
        "Record or update the caller's name, contact details, and reason for calling."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "email": { "type": "string" },
                "phone": { "type": "string" },
                "reason": { "type": "string", "description": "Why the caller is reaching out." },
                "urgency": { "type": "string", "enum": ["low", "normal", "high"] }
            }
        })
    }

    async fn execute(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> ToolOutput {
        let args: Args = match serde_json::from_value(call.args.clone()) {
            Ok(a) => a,
            Err(e) => return ToolOutput::err(&call.id, format!("invalid arguments: {e}")),
        };
        let info = &mut ctx.session.user_info;
        if let Some(name) = args.name {
            info.name = Some(name);
        }
        if let Some(email) = args.email {
            info.email = Some(email);
        }
        if let Some(phone) = args.phone {
            info.phone = Some(phone);
        }
        if let Some(reason) = args.reason {
            info.reason = Some(reason);
        }
        if let Some(urgency) = args.urgency {
            info.urgency = Some(urgency);
        }
        ToolOutput::ok(&call.id, "caller info updated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telagent_config::BusinessConfig;
    use telagent_core::Session;

    fn business() -> BusinessConfig {
        serde_yaml::from_str("display_name: Acme\nprompt: hi\n").unwrap()
    }

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let t = UpdateUserInfoTool;
        let mut session = Session::new("acme");
        session.user_info.phone = Some("+15551234567".into());
        let business = business();
        let call = ToolCall {
            id: "1".into(),
            name: t.name().into(),
            args: json!({"name": "Jane", "reason": "billing question"}),
        };
        let out = t.execute(&call, &mut ToolContext { session: &mut session, business: &business }).await;
        assert!(!out.is_error);
        assert_eq!(session.user_info.name.as_deref(), Some("Jane"));
        assert_eq!(session.user_info.reason.as_deref(), Some("billing question"));
        assert_eq!(session.user_info.phone.as_deref(), Some("+15551234567"));
    }

    #[tokio::test]
    async fn empty_args_leaves_info_untouched() {
        let t = UpdateUserInfoTool;
        let mut session = Session::new("acme");
        session.user_info.name = Some("Existing".into());
        let business = business();
        let call = ToolCall { id: "1".into(), name: t.name().into(), args: json!({}) };
        t.execute(&call, &mut ToolContext { session: &mut session, business: &business }).await;
        assert_eq!(session.user_info.name.as_deref(), Some("Existing"));
    }
}
