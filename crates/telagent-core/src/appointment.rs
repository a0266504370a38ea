// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Appointment booking sub-flow (§4.4): a strict, ordered micro-state
//! machine nested inside the Conversational phase of [`crate::Session`].

use serde::{Deserialize, Serialize};
use telagent_config::CalendarProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStep {
    SelectCalendar,
    CollectTitle,
    CollectDate,
    CollectTime,
    Review,
    Confirm,
    CollectName,
    CollectEmail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub time_display: Option<String>,
    pub available_slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentFlow {
    pub active: bool,
    pub step: AppointmentStep,
    pub calendar_type: Option<CalendarProvider>,
    pub details: AppointmentDetails,
}

impl Default for AppointmentFlow {
    fn default() -> Self {
        Self {
            active: false,
            step: AppointmentStep::SelectCalendar,
            calendar_type: None,
            details: AppointmentDetails::default(),
        }
    }
}

/// Guidance text returned when an action is attempted out of order. Never
/// mutates state.
pub fn step_guidance(step: AppointmentStep) -> &'static str {
    match step {
        AppointmentStep::SelectCalendar => "Say Google or Microsoft.",
        AppointmentStep::CollectTitle => "Describe the type of appointment.",
        AppointmentStep::CollectDate => {
            "Provide the date, for example 'October 16, 2025' or '16 October 2025'."
        }
        AppointmentStep::CollectTime => "Choose one of the listed available times.",
        AppointmentStep::Review | AppointmentStep::Confirm => {
            "Say 'sounds good' to confirm, or tell me what to change."
        }
        AppointmentStep::CollectName => "What name should I put on the appointment?",
        AppointmentStep::CollectEmail => "What email address should I send the confirmation to?",
    }
}

impl AppointmentFlow {
    pub fn start(&mut self) {
        self.active = true;
        self.step = AppointmentStep::SelectCalendar;
        self.details = AppointmentDetails::default();
        self.calendar_type = None;
    }

    pub fn set_calendar(&mut self, provider: CalendarProvider) -> Result<(), &'static str> {
        if self.step != AppointmentStep::SelectCalendar {
            return Err(step_guidance(self.step));
        }
        self.calendar_type = Some(provider);
        self.step = AppointmentStep::CollectTitle;
        Ok(())
    }

    pub fn set_service(&mut self, title: String) -> Result<(), &'static str> {
        if self.step != AppointmentStep::CollectTitle {
            return Err(step_guidance(self.step));
        }
        self.details.title = Some(title);
        self.step = AppointmentStep::CollectDate;
        Ok(())
    }

    /// Setting a new date always clears any previously-selected time and
    /// slots (§4.4 invariant — changing date rolls back time).
    pub fn set_date(&mut self, date: String, available_slots: Vec<String>) -> Result<(), &'static str> {
        if self.step != AppointmentStep::CollectDate && self.step != AppointmentStep::Review {
            return Err(step_guidance(self.step));
        }
        self.details.date = Some(date);
        self.details.time = None;
        self.details.time_display = None;
        self.details.available_slots = available_slots;
        self.step = AppointmentStep::CollectTime;
        Ok(())
    }

    pub fn set_time(&mut self, time: String, display: String) -> Result<(), &'static str> {
        if self.step != AppointmentStep::CollectTime {
            return Err(step_guidance(self.step));
        }
        if !self.details.available_slots.iter().any(|s| s == &time) {
            return Err("That time isn't one of the listed available slots.");
        }
        self.details.time = Some(time);
        self.details.time_display = Some(display);
        self.step = AppointmentStep::Review;
        Ok(())
    }

    /// Returns true iff every field required for `createAppointment` is
    /// present, regardless of caller name/email (those live on the owning
    /// [`crate::Session`]).
    pub fn is_ready_to_confirm(&self) -> bool {
        self.calendar_type.is_some()
            && self.details.title.is_some()
            && self.details.date.is_some()
            && self.details.time.is_some()
            && matches!(self.step, AppointmentStep::Review | AppointmentStep::Confirm)
    }

    /// Edit jump back to CollectDate, preserving the selected service.
    pub fn jump_to_date(&mut self) {
        self.details.time = None;
        self.details.time_display = None;
        self.details.available_slots.clear();
        self.step = AppointmentStep::CollectDate;
    }

    /// Edit jump back to CollectTime, preserving service + date + slots.
    pub fn jump_to_time(&mut self) {
        self.step = AppointmentStep::CollectTime;
    }

    /// Edit jump back to CollectTitle, preserving date/time if still valid.
    pub fn jump_to_title(&mut self) {
        self.step = AppointmentStep::CollectTitle;
    }

    pub fn jump_to_name(&mut self) {
        self.step = AppointmentStep::CollectName;
    }

    pub fn jump_to_email(&mut self) {
        self.step = AppointmentStep::CollectEmail;
    }
}
