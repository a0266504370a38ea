// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-call conversational state (§3). One [`Session`] is owned by exactly
//! one call's actor task in telagent-gateway for the call's lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointment::AppointmentFlow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Greeting,
    CollectingIdentity,
    Conversational,
    Goodbye,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub reason: Option<String>,
    pub urgency: Option<String>,
}

impl UserInfo {
    /// Minimum bar for leaving CollectingIdentity: name and email. Reason,
    /// phone, and urgency are collected opportunistically but not required.
    pub fn collected(&self) -> bool {
        self.name.is_some() && self.email.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A completed booking, retained after [`AppointmentFlow`] resets so the
/// conversation can still refer back to "the appointment we just booked".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedAppointment {
    pub event_id: String,
    pub title: String,
    pub date: String,
    pub time_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tenant_id: String,
    pub phase: Phase,
    pub user_info: UserInfo,
    pub history: Vec<HistoryEntry>,
    pub appointment: Option<AppointmentFlow>,
    pub last_appointment: Option<ConfirmedAppointment>,
    /// True while a model response is actively streaming; gates barge-in.
    pub is_responding: bool,
    pub active_response_id: Option<String>,
    /// True once the caller has spoken over the agent; the media bridge
    /// drops queued output frames while this is set (§4.2 barge-in).
    pub suppress_audio: bool,
    /// Set when a tool call is outstanding and the agent owes the caller a
    /// spoken update once it resolves.
    pub awaiting_follow_up: bool,
}

impl Session {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            phase: Phase::Greeting,
            user_info: UserInfo::default(),
            history: Vec::new(),
            appointment: None,
            last_appointment: None,
            is_responding: false,
            active_response_id: None,
            suppress_audio: false,
            awaiting_follow_up: false,
        }
    }

    pub fn append_history(&mut self, role: impl Into<String>, text: impl Into<String>) {
        self.history.push(HistoryEntry {
            role: role.into(),
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    /// Advance to the next phase, refusing a backwards or no-op transition.
    pub fn advance_phase(&mut self, to: Phase) -> Result<Phase, String> {
        let allowed = matches!(
            (self.phase, to),
            (Phase::Greeting, Phase::CollectingIdentity)
                | (Phase::Greeting, Phase::Conversational)
                | (Phase::CollectingIdentity, Phase::Conversational)
                | (Phase::Conversational, Phase::Goodbye)
        );
        if !allowed {
            return Err(format!("cannot advance from {:?} to {:?}", self.phase, to));
        }
        let from = self.phase;
        self.phase = to;
        Ok(from)
    }

    pub fn start_appointment_flow(&mut self) {
        let mut flow = AppointmentFlow::default();
        flow.start();
        self.appointment = Some(flow);
    }

    /// Called when the appointment tool call succeeds: archive the booking
    /// and clear the in-progress flow (§3 ownership: AppointmentFlow is
    /// transient, ConfirmedAppointment is the durable record).
    pub fn confirm_appointment(&mut self, event_id: impl Into<String>) {
        if let Some(flow) = &self.appointment {
            self.last_appointment = Some(ConfirmedAppointment {
                event_id: event_id.into(),
                title: flow.details.title.clone().unwrap_or_default(),
                date: flow.details.date.clone().unwrap_or_default(),
                time_display: flow.details.time_display.clone().unwrap_or_default(),
            });
        }
        self.appointment = None;
    }

    pub fn barge_in(&mut self) {
        self.suppress_audio = true;
        self.is_responding = false;
        self.active_response_id = None;
    }

    pub fn clear_barge_in(&mut self) {
        self.suppress_audio = false;
    }
}
