// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Post-call Notifier (C7, §4.7): generates a one-shot structured summary of
//! the call and fans it out over email and SMS. Fire-and-forget — a failure
//! here never affects the call itself, only its own logged outcome.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use telagent_config::BusinessConfig;
use telagent_core::Session;
use telagent_drivers::{EmailDriver, SmsDriver};

/// Structured call summary (§4.7). Falls back to [`CallSummary::fallback`]
/// when the summarizer's output can't be parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct CallSummary {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub customer_needs: String,
    #[serde(default)]
    pub next_steps: String,
}

impl CallSummary {
    fn fallback() -> Self {
        Self {
            summary: "A call was handled; no structured summary could be generated.".to_string(),
            key_points: Vec::new(),
            topics: Vec::new(),
            customer_needs: String::new(),
            next_steps: String::new(),
        }
    }
}

/// Thin one-shot chat-completions client used only to turn a call transcript
/// into a [`CallSummary`]. Deliberately narrower than a full multi-provider
/// model abstraction: this is the summarizer's only call site, bounded to a
/// single OpenAI-compatible `/chat/completions` request (see DESIGN.md).
pub struct Summarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl Summarizer {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    async fn summarize(&self, transcript: &str) -> anyhow::Result<CallSummary> {
        let mut req = self.client.post(format!("{}/chat/completions", self.base_url.trim_end_matches('/'))).json(&json!({
            "model": self.model,
            "max_tokens": 400,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": "Summarize the following call transcript as JSON with keys summary, key_points (array), topics (array), customer_needs, next_steps. Output only the JSON object."
                },
                { "role": "user", "content": transcript },
            ],
        }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp: serde_json::Value = req.send().await?.error_for_status()?.json().await?;
        let content = resp["choices"][0]["message"]["content"].as_str().unwrap_or("");
        Ok(serde_json::from_str(content).unwrap_or_else(|_| CallSummary::fallback()))
    }
}

/// Owns the drivers and summarizer needed to notify after every call.
pub struct Notifier {
    summarizer: Option<Summarizer>,
    email: Arc<dyn EmailDriver>,
    sms: Arc<dyn SmsDriver>,
}

impl Notifier {
    pub fn new(summarizer: Option<Summarizer>, email: Arc<dyn EmailDriver>, sms: Arc<dyn SmsDriver>) -> Self {
        Self { summarizer, email, sms }
    }

    /// Runs the full §4.7 sequence. Skips entirely if nothing was collected
    /// and the business has no fixed admin recipient.
    pub async fn notify(&self, session: &Session, business: &BusinessConfig) {
        let has_admin_recipient = business
            .email
            .as_ref()
            .map(|e| !e.admin_addresses.is_empty())
            .unwrap_or(false)
            || business
                .sms
                .as_ref()
                .map(|s| !s.admin_numbers.is_empty())
                .unwrap_or(false);

        if session.user_info.name.is_none() && session.user_info.email.is_none() && !has_admin_recipient {
            return;
        }

        let transcript = transcript_text(session);
        let summary = match &self.summarizer {
            Some(s) => match s.summarize(&transcript).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(call_id = %session.id, error = %e, "call summarization failed, using fallback summary");
                    CallSummary::fallback()
                }
            },
            None => CallSummary::fallback(),
        };

        self.send_email(session, business, &summary).await;
        self.send_sms(session, business, &summary).await;
    }

    async fn send_email(&self, session: &Session, business: &BusinessConfig, summary: &CallSummary) {
        let Some(cfg) = &business.email else { return };
        let subject = format!("Call summary — {}", business.display_name);
        let body = render_summary_body(summary);

        let mut recipients: Vec<String> = cfg.admin_addresses.clone();
        if let Some(email) = &session.user_info.email {
            recipients.push(email.clone());
        }

        for to in recipients {
            match self.email.send(cfg, &to, &subject, &body).await {
                Ok(()) => tracing::info!(call_id = %session.id, %to, "call summary email sent"),
                Err(e) => tracing::warn!(call_id = %session.id, %to, error = %e, "call summary email failed"),
            }
        }
    }

    async fn send_sms(&self, session: &Session, business: &BusinessConfig, summary: &CallSummary) {
        let Some(cfg) = &business.sms else { return };
        let body = format!("{}: {}", business.display_name, summary.summary);

        let mut recipients: Vec<String> = cfg.admin_numbers.clone();
        if let Some(phone) = &session.user_info.phone {
            recipients.push(phone.clone());
        }

        for to in recipients {
            match self.sms.send(cfg, &to, &body).await {
                Ok(()) => tracing::info!(call_id = %session.id, %to, "call summary sms sent"),
                Err(e) => tracing::warn!(call_id = %session.id, %to, error = %e, "call summary sms failed"),
            }
        }
    }
}

fn transcript_text(session: &Session) -> String {
    session
        .history
        .iter()
        .map(|entry| format!("{}: {}", entry.role, entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_summary_body(summary: &CallSummary) -> String {
    let mut body = format!("{}\n\n", summary.summary);
    if !summary.key_points.is_empty() {
        body.push_str("Key points:\n");
        for point in &summary.key_points {
            body.push_str(&format!("- {point}\n"));
        }
    }
    if !summary.customer_needs.is_empty() {
        body.push_str(&format!("\nCustomer needs: {}\n", summary.customer_needs));
    }
    if !summary.next_steps.is_empty() {
        body.push_str(&format!("\nNext steps: {}\n", summary.next_steps));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use telagent_drivers::{LoggingEmailDriver, LoggingSmsDriver};

    fn business(yaml: &str) -> BusinessConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn notifier() -> (Notifier, Arc<LoggingEmailDriver>, Arc<LoggingSmsDriver>) {
        let email = Arc::new(LoggingEmailDriver::default());
        let sms = Arc::new(LoggingSmsDriver::default());
        (Notifier::new(None, email.clone(), sms.clone()), email, sms)
    }

    #[tokio::test]
    async fn skips_when_nothing_collected_and_no_admin_recipient() {
        let (notifier, email, _sms) = notifier();
        let biz = business("display_name: Acme\nprompt: hi\n");
        let session = Session::new("acme");
        notifier.notify(&session, &biz).await;
        assert!(email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sends_to_admin_recipient_even_without_caller_info() {
        let (notifier, email, sms) = notifier();
        let biz = business(
            "display_name: Acme\nprompt: hi\nemail:\n  from_address: noreply@acme.test\n  admin_addresses: [admin@acme.test]\nsms:\n  admin_numbers: [\"+15551230000\"]\n",
        );
        let session = Session::new("acme");
        notifier.notify(&session, &biz).await;
        assert_eq!(email.sent.lock().unwrap().len(), 1);
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sends_to_caller_email_when_collected() {
        let (notifier, email, _sms) = notifier();
        let biz = business(
            "display_name: Acme\nprompt: hi\nemail:\n  from_address: noreply@acme.test\n  admin_addresses: []\n",
        );
        let mut session = Session::new("acme");
        session.user_info.name = Some("Ada".into());
        session.user_info.email = Some("ada@example.com".into());
        notifier.notify(&session, &biz).await;
        let sent = email.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
    }

    #[test]
    fn fallback_summary_is_non_empty() {
        let summary = CallSummary::fallback();
        assert!(!summary.summary.is_empty());
    }
}
