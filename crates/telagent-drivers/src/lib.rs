// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Driver ports (C8): the boundary between the per-call conversation state
//! machine and the outside world (calendars, email, SMS, the business
//! knowledge base, and carrier call redirection).
//!
//! Every port is a plain `async_trait` with a concrete fallback/demo
//! implementation, mirroring the provider-boundary pattern used elsewhere in
//! this codebase for pluggable backends: a narrow trait plus one or more
//! implementers, selected by a small id-keyed lookup rather than a generic
//! parameter threaded through every caller.

mod calendar;
mod notify;
mod redirect;
mod retrieval;

pub use calendar::{
    AppointmentRequest, CalendarDriver, GoogleCalendarDriver, MicrosoftCalendarDriver,
    MockCalendarDriver,
};
pub use notify::{EmailDriver, LoggingEmailDriver, LoggingSmsDriver, SmsDriver};
pub use redirect::{CallRedirectHook, LoggingRedirectHook};
pub use retrieval::{KnowledgeSnippet, RetrievalDriver, StaticRetrievalDriver};

use std::sync::Arc;
use telagent_config::CalendarProvider;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("requested slot is no longer available")]
    SlotUnavailable,
    #[error("driver not configured: {0}")]
    NotConfigured(&'static str),
}

/// Select the concrete calendar backend for a business's configured
/// provider. Centralizing the match here keeps callers (the
/// `schedule_appointment` tool) provider-agnostic.
pub fn calendar_driver_for(provider: CalendarProvider) -> Arc<dyn CalendarDriver> {
    match provider {
        CalendarProvider::Google => Arc::new(GoogleCalendarDriver::default()),
        CalendarProvider::Microsoft => Arc::new(MicrosoftCalendarDriver::default()),
    }
}
