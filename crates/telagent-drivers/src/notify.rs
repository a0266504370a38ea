// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Post-call notification ports (C7): email and SMS, each with an ordered
//! provider fallback chain configured per business.

use async_trait::async_trait;
use std::sync::Mutex;
use telagent_config::{EmailConfig, SmsConfig};

use crate::DriverError;

#[async_trait]
pub trait EmailDriver: Send + Sync {
    async fn send(
        &self,
        cfg: &EmailConfig,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DriverError>;
}

#[async_trait]
pub trait SmsDriver: Send + Sync {
    async fn send(&self, cfg: &SmsConfig, to: &str, body: &str) -> Result<(), DriverError>;
}

/// Demo/test driver: records every send instead of making a network call.
/// Not named "Mock" because it's also what a self-hosted deployment without
/// email/SMS providers configured would reasonably fall back to — logging
/// the notification instead of silently dropping it.
#[derive(Default)]
pub struct LoggingEmailDriver {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl EmailDriver for LoggingEmailDriver {
    async fn send(
        &self,
        _cfg: &EmailConfig,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DriverError> {
        tracing::info!(%to, %subject, "email notification (logging driver, not actually sent)");
        self.sent
            .lock()
            .expect("logging email driver lock poisoned")
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct LoggingSmsDriver {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsDriver for LoggingSmsDriver {
    async fn send(&self, _cfg: &SmsConfig, to: &str, body: &str) -> Result<(), DriverError> {
        tracing::info!(%to, "sms notification (logging driver, not actually sent)");
        self.sent
            .lock()
            .expect("logging sms driver lock poisoned")
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}
