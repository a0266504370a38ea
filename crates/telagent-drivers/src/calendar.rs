// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use telagent_config::CalendarConfig;

use crate::DriverError;

#[derive(Debug, Clone)]
pub struct AppointmentRequest {
    pub title: String,
    pub date: String,
    pub time: String,
    pub attendee_name: String,
    pub attendee_email: Option<String>,
}

/// A business's calendar, reached through whichever provider it configured.
/// Every call goes through `cfg` rather than baked-in credentials, since a
/// single running gateway serves many tenants.
#[async_trait]
pub trait CalendarDriver: Send + Sync {
    /// `HH:MM` slot starts still open on `date` within `cfg`'s business hours.
    async fn list_open_slots(&self, cfg: &CalendarConfig, date: &str) -> Result<Vec<String>, DriverError>;

    /// Book the appointment, returning the provider's event id.
    async fn create_appointment(
        &self,
        cfg: &CalendarConfig,
        req: AppointmentRequest,
    ) -> Result<String, DriverError>;
}

#[derive(Default)]
pub struct GoogleCalendarDriver;

#[async_trait]
impl CalendarDriver for GoogleCalendarDriver {
    async fn list_open_slots(&self, cfg: &CalendarConfig, _date: &str) -> Result<Vec<String>, DriverError> {
        tracing::warn!(
            calendar_id = %cfg.calendar_id,
            "GoogleCalendarDriver is a network stub; returning no slots"
        );
        Err(DriverError::NotConfigured("google calendar API client"))
    }

    async fn create_appointment(
        &self,
        _cfg: &CalendarConfig,
        _req: AppointmentRequest,
    ) -> Result<String, DriverError> {
        Err(DriverError::NotConfigured("google calendar API client"))
    }
}

#[derive(Default)]
pub struct MicrosoftCalendarDriver;

#[async_trait]
impl CalendarDriver for MicrosoftCalendarDriver {
    async fn list_open_slots(&self, cfg: &CalendarConfig, _date: &str) -> Result<Vec<String>, DriverError> {
        tracing::warn!(
            calendar_id = %cfg.calendar_id,
            "MicrosoftCalendarDriver is a network stub; returning no slots"
        );
        Err(DriverError::NotConfigured("microsoft graph API client"))
    }

    async fn create_appointment(
        &self,
        _cfg: &CalendarConfig,
        _req: AppointmentRequest,
    ) -> Result<String, DriverError> {
        Err(DriverError::NotConfigured("microsoft graph API client"))
    }
}

/// In-memory calendar used by tests and local/demo deployments: slots are
/// whatever `open_slots` lists, minus anything already booked this run.
pub struct MockCalendarDriver {
    open_slots: Vec<String>,
    booked: std::sync::Mutex<Vec<String>>,
}

impl MockCalendarDriver {
    pub fn new(open_slots: Vec<String>) -> Self {
        Self {
            open_slots,
            booked: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CalendarDriver for MockCalendarDriver {
    async fn list_open_slots(&self, _cfg: &CalendarConfig, _date: &str) -> Result<Vec<String>, DriverError> {
        let booked = self.booked.lock().expect("mock calendar lock poisoned");
        Ok(self
            .open_slots
            .iter()
            .filter(|s| !booked.contains(s))
            .cloned()
            .collect())
    }

    async fn create_appointment(
        &self,
        _cfg: &CalendarConfig,
        req: AppointmentRequest,
    ) -> Result<String, DriverError> {
        let mut booked = self.booked.lock().expect("mock calendar lock poisoned");
        if booked.contains(&req.time) {
            return Err(DriverError::SlotUnavailable);
        }
        booked.push(req.time);
        Ok(format!("mock-evt-{}", uuid::Uuid::new_v4()))
    }
}
