// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Timeout enforcement for the two clocks a call is subject to (§5):
//! a hard ceiling on the whole call, and a soft ceiling on any single tool
//! invocation.

use std::future::Future;
use std::time::Duration;

use telagent_config::CallLimits;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeoutError {
    #[error("call exceeded its hard timeout")]
    CallTimedOut,
    #[error("tool call exceeded its timeout")]
    ToolTimedOut,
}

/// Runs `fut` to completion, or fails with [`TimeoutError::ToolTimedOut`]
/// after `limits.tool_timeout_secs`. Used around every individual tool
/// execution (calendar lookups, email/SMS sends) so a stuck upstream driver
/// can never hang the call indefinitely.
pub async fn run_tool_with_timeout<F, T>(limits: &CallLimits, fut: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(limits.tool_timeout_secs), fut)
        .await
        .map_err(|_| TimeoutError::ToolTimedOut)
}

/// A handle that fires once a call's hard timeout elapses. The gateway's
/// per-call task races this against its normal event loop and tears the
/// call down (with a spoken goodbye, if still connected) when it fires.
pub struct CallDeadline {
    sleep: std::pin::Pin<Box<tokio::time::Sleep>>,
}

impl CallDeadline {
    pub fn new(limits: &CallLimits) -> Self {
        Self {
            sleep: Box::pin(tokio::time::sleep(Duration::from_secs(limits.hard_timeout_secs))),
        }
    }

    /// Resolves once the hard timeout has elapsed. Intended as one arm of a
    /// `tokio::select!` alongside the call's normal event sources.
    pub async fn expired(&mut self) {
        (&mut self.sleep).await;
    }
}
