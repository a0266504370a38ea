// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::session::Phase;

/// Events emitted by a call's state machine. Consumers (the realtime-session
/// event loop in telagent-gateway, and any operator-facing observer) react
/// to these to drive side effects such as clearing the pacing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    HistoryAppended { role: String, text: String },
    UserInfoUpdated { collected: bool },
    AppointmentStepChanged { step: String },
    AppointmentConfirmed { event_id: String },
    SuppressAudioSet(bool),
    Error(String),
}
