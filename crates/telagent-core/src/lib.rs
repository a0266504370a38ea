// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod appointment;
mod dates;
mod events;
mod extract;
mod intent;
mod session;

pub use appointment::{AppointmentDetails, AppointmentFlow, AppointmentStep, step_guidance};
pub use dates::{
    format_slot_for_speech, next_available_day, parse_date, slots_for_day, DateParseError,
    MAX_WALK_FORWARD_DAYS,
};
pub use events::SessionEvent;
pub use extract::{extract, ExtractedInfo};
pub use intent::{classify, Intent};
pub use session::{ConfirmedAppointment, HistoryEntry, Phase, Session, UserInfo};
