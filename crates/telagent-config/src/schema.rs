// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Configuration schema for the gateway process and the per-business tenant
//! registry.
//!
//! Two YAML documents are recognized:
//! - the gateway's own operational config ([`GatewayConfig`]: bind address,
//!   upstream realtime credentials, carrier signature secret);
//! - the tenant registry ([`RegistryFile`], a map of business id →
//!   [`BusinessConfig`]).
//!
//! Both are loaded through the same deep-merge layering in [`crate::loader`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

// ── Gateway process config ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub realtime: RealtimeConfig,
    pub call: CallLimits,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            realtime: RealtimeConfig::default(),
            call: CallLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the carrier signalling + media WebSocket endpoints bind to.
    pub bind: String,
    /// Environment variable holding the shared secret used to verify the
    /// carrier's signalling signature header. `None` disables verification
    /// (logged once as a warning at startup — see C1 in SPEC_FULL.md §4.1).
    pub carrier_signature_secret_env: Option<String>,
    /// Public base URL the carrier should use to reach the media WebSocket,
    /// e.g. `wss://gateway.example.com`.
    pub public_media_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8088".to_string(),
            carrier_signature_secret_env: None,
            public_media_url: "wss://127.0.0.1:8088/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Environment variable holding the bearer API key for the upstream
    /// realtime model provider.
    pub api_key_env: String,
    /// Upstream realtime WebSocket URL.
    pub url: String,
    /// Voice identity requested in `session.update` when a business does not
    /// override it.
    pub default_voice: String,
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f32,
    #[serde(default = "default_prefix_padding_ms")]
    pub prefix_padding_ms: u32,
    #[serde(default = "default_silence_duration_ms")]
    pub silence_duration_ms: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_vad_threshold() -> f32 {
    0.3
}
fn default_prefix_padding_ms() -> u32 {
    100
}
fn default_silence_duration_ms() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.8
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "TELAGENT_REALTIME_API_KEY".to_string(),
            url: "wss://realtime.example.com/v1/realtime".to_string(),
            default_voice: "alloy".to_string(),
            vad_threshold: default_vad_threshold(),
            prefix_padding_ms: default_prefix_padding_ms(),
            silence_duration_ms: default_silence_duration_ms(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallLimits {
    #[serde(default = "default_hard_timeout_secs")]
    pub hard_timeout_secs: u64,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_pacing_queue_cap_ms")]
    pub pacing_queue_cap_ms: u64,
}

fn default_hard_timeout_secs() -> u64 {
    30 * 60
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_pacing_queue_cap_ms() -> u64 {
    2000
}

impl Default for CallLimits {
    fn default() -> Self {
        Self {
            hard_timeout_secs: default_hard_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            pacing_queue_cap_ms: default_pacing_queue_cap_ms(),
        }
    }
}

// ── Tenant registry ───────────────────────────────────────────────────────────

/// Top-level shape of the registry YAML file: a map keyed by business id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub businesses: HashMap<String, BusinessConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub display_name: String,
    #[serde(default)]
    pub incoming_numbers: Vec<String>,
    pub prompt: String,
    #[serde(default)]
    pub feature_flags: FeatureFlags,
    #[serde(default)]
    pub calendar: Option<CalendarConfig>,
    #[serde(default)]
    pub sms: Option<SmsConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub company_info: CompanyInfo,
    /// Digit that triggers the emergency transfer handler (§9 open question:
    /// the exact digit is business-specific, never assume "#").
    #[serde(default = "default_emergency_digit")]
    pub emergency_digit: String,
    #[serde(default)]
    pub emergency_transfer_number: Option<String>,
    /// IANA timezone name all calendar operations for this business are
    /// anchored to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_emergency_digit() -> String {
    "#".to_string()
}
fn default_timezone() -> String {
    "America/Denver".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub rag_enabled: bool,
    #[serde(default = "default_true")]
    pub appointment_booking_enabled: bool,
    #[serde(default)]
    pub emergency_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            rag_enabled: true,
            appointment_booking_enabled: true,
            emergency_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarProvider {
    Google,
    Microsoft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub provider: CalendarProvider,
    /// Environment variable holding the provider credential/token.
    pub credentials_env: String,
    pub calendar_id: String,
    /// Business-hours window slots are generated within, e.g. ("12:00", "16:00").
    #[serde(default = "default_hours_start")]
    pub hours_start: String,
    #[serde(default = "default_hours_end")]
    pub hours_end: String,
}

fn default_hours_start() -> String {
    "12:00".to_string()
}
fn default_hours_end() -> String {
    "16:00".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub from_number: Option<String>,
    pub messaging_service_sid: Option<String>,
    #[serde(default)]
    pub admin_numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from_address: String,
    #[serde(default)]
    pub admin_addresses: Vec<String>,
    /// Ordered fallback chain of driver ids, e.g. `["sendgrid", "smtp"]`.
    #[serde(default)]
    pub provider_fallback_chain: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub service_areas: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_config_defaults_are_loopback_bind() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.http.bind, "127.0.0.1:8088");
    }

    #[test]
    fn gateway_config_carrier_secret_defaults_to_none() {
        let cfg = GatewayConfig::default();
        assert!(cfg.http.carrier_signature_secret_env.is_none());
    }

    #[test]
    fn realtime_config_defaults_match_spec_constants() {
        let cfg = RealtimeConfig::default();
        assert_eq!(cfg.vad_threshold, 0.3);
        assert_eq!(cfg.prefix_padding_ms, 100);
        assert_eq!(cfg.silence_duration_ms, 1000);
        assert_eq!(cfg.temperature, 0.8);
    }

    #[test]
    fn call_limits_defaults_match_spec() {
        let cfg = CallLimits::default();
        assert_eq!(cfg.hard_timeout_secs, 1800);
        assert_eq!(cfg.tool_timeout_secs, 30);
        assert_eq!(cfg.pacing_queue_cap_ms, 2000);
    }

    #[test]
    fn feature_flags_default_enables_rag_and_appointments_but_not_emergency() {
        let flags = FeatureFlags::default();
        assert!(flags.rag_enabled);
        assert!(flags.appointment_booking_enabled);
        assert!(!flags.emergency_enabled);
    }

    #[test]
    fn business_config_yaml_round_trip() {
        let yaml = r#"
display_name: Acme Dental
incoming_numbers: ["+15551110001"]
prompt: "You are a friendly receptionist for Acme Dental."
feature_flags:
  emergency_enabled: true
calendar:
  provider: google
  credentials_env: ACME_GOOGLE_TOKEN
  calendar_id: acme-primary
sms:
  from_number: "+15551110002"
  admin_numbers: ["+15559998888"]
email:
  from_address: "noreply@acme.example"
  admin_addresses: ["admin@acme.example"]
emergency_transfer_number: "+15550000911"
"#;
        let cfg: BusinessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.display_name, "Acme Dental");
        assert_eq!(cfg.incoming_numbers, vec!["+15551110001"]);
        assert!(cfg.feature_flags.emergency_enabled);
        assert_eq!(cfg.timezone, "America/Denver");
        assert_eq!(cfg.emergency_digit, "#");
        let cal = cfg.calendar.unwrap();
        assert_eq!(cal.provider, CalendarProvider::Google);
        assert_eq!(cal.hours_start, "12:00");
        assert_eq!(cal.hours_end, "16:00");
    }

    #[test]
    fn registry_file_parses_multiple_businesses() {
        let yaml = r#"
businesses:
  acme:
    display_name: Acme
    prompt: "hi"
  beta:
    display_name: Beta
    prompt: "hello"
"#;
        let reg: RegistryFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(reg.businesses.len(), 2);
        assert!(reg.businesses.contains_key("acme"));
        assert!(reg.businesses.contains_key("beta"));
    }
}
