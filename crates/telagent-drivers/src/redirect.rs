// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Emergency call-redirect hook (C5/C8): transfers the active call to a
//! human. The actual transfer mechanics are carrier-specific (SIP REFER,
//! Twilio `<Dial>` TwiML, etc.) and live behind this port so the tool
//! handler and state machine stay carrier-agnostic.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::DriverError;

#[async_trait]
pub trait CallRedirectHook: Send + Sync {
    async fn redirect(&self, call_id: &str, target_number: &str) -> Result<(), DriverError>;
}

/// Records redirect requests instead of issuing a carrier API call. Used in
/// tests and as the default until a carrier-specific hook is wired in.
#[derive(Default)]
pub struct LoggingRedirectHook {
    pub redirects: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CallRedirectHook for LoggingRedirectHook {
    async fn redirect(&self, call_id: &str, target_number: &str) -> Result<(), DriverError> {
        tracing::warn!(%call_id, %target_number, "emergency redirect requested (logging hook, not actually transferred)");
        self.redirects
            .lock()
            .expect("logging redirect hook lock poisoned")
            .push((call_id.to_string(), target_number.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_hook_records_redirect() {
        let hook = LoggingRedirectHook::default();
        hook.redirect("call-1", "+15550000911").await.unwrap();
        let redirects = hook.redirects.lock().unwrap();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0], ("call-1".to_string(), "+15550000911".to_string()));
    }
}
