// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tenant registry (C6): maps a called phone number to a business id and
//! serves that business's configuration read-mostly to every call.
//!
//! The registry is rebuilt wholesale on reload — no business is ever
//! partially updated mid-reload (§5 shared-resource policy).

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::{BusinessConfig, RegistryFile};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no business is registered for number {0}")]
    UnknownNumber(String),
    #[error("unknown business id {0}")]
    UnknownBusiness(String),
    #[error("business {business} enables {feature} but is missing required configuration")]
    MissingFeatureConfig { business: String, feature: &'static str },
}

struct Inner {
    by_id: HashMap<String, BusinessConfig>,
    number_to_id: HashMap<String, String>,
}

/// Read-mostly map from carrier-called-number to [`BusinessConfig`].
///
/// Cloning is cheap ([`std::sync::Arc`]-style sharing is left to the caller);
/// `reload` atomically swaps the entire inner map so concurrent readers never
/// observe a half-updated registry.
pub struct TenantRegistry {
    inner: RwLock<Inner>,
}

impl TenantRegistry {
    pub fn new(file: RegistryFile) -> Result<Self, RegistryError> {
        let inner = build_inner(file)?;
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_id: HashMap::new(),
                number_to_id: HashMap::new(),
            }),
        }
    }

    /// Replace the entire registry contents atomically.
    pub fn reload(&self, file: RegistryFile) -> Result<(), RegistryError> {
        let inner = build_inner(file)?;
        *self.inner.write().expect("registry lock poisoned") = inner;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !self.inner.read().expect("registry lock poisoned").by_id.is_empty()
    }

    pub fn business_id_from_phone(&self, called_number: &str) -> Result<String, RegistryError> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .number_to_id
            .get(called_number)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownNumber(called_number.to_string()))
    }

    /// Tenant ids currently in the registry, sorted for stable CLI output.
    pub fn tenant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .read()
            .expect("registry lock poisoned")
            .by_id
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn get_config(&self, business_id: &str) -> Result<BusinessConfig, RegistryError> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .by_id
            .get(business_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownBusiness(business_id.to_string()))
    }
}

fn build_inner(file: RegistryFile) -> Result<Inner, RegistryError> {
    let mut number_to_id = HashMap::new();
    for (id, biz) in &file.businesses {
        validate_feature_config(id, biz)?;
        for number in &biz.incoming_numbers {
            number_to_id.insert(number.clone(), id.clone());
        }
    }
    Ok(Inner {
        by_id: file.businesses,
        number_to_id,
    })
}

fn validate_feature_config(id: &str, biz: &BusinessConfig) -> Result<(), RegistryError> {
    if biz.feature_flags.appointment_booking_enabled && biz.calendar.is_none() {
        return Err(RegistryError::MissingFeatureConfig {
            business: id.to_string(),
            feature: "appointment_booking",
        });
    }
    if biz.feature_flags.emergency_enabled && biz.emergency_transfer_number.is_none() {
        return Err(RegistryError::MissingFeatureConfig {
            business: id.to_string(),
            feature: "emergency_transfer",
        });
    }
    Ok(())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(yaml: &str) -> RegistryFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn empty_registry_is_not_initialized() {
        let reg = TenantRegistry::empty();
        assert!(!reg.is_initialized());
    }

    #[test]
    fn populated_registry_is_initialized() {
        let file = file_with(
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n    incoming_numbers: [\"+15551110001\"]\n",
        );
        let reg = TenantRegistry::new(file).unwrap();
        assert!(reg.is_initialized());
    }

    #[test]
    fn business_id_from_phone_resolves_registered_number() {
        let file = file_with(
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n    incoming_numbers: [\"+15551110001\"]\n",
        );
        let reg = TenantRegistry::new(file).unwrap();
        assert_eq!(reg.business_id_from_phone("+15551110001").unwrap(), "acme");
    }

    #[test]
    fn unknown_number_is_rejected() {
        let reg = TenantRegistry::empty();
        assert!(matches!(
            reg.business_id_from_phone("+10000000000"),
            Err(RegistryError::UnknownNumber(_))
        ));
    }

    #[test]
    fn get_config_returns_clone_for_known_business() {
        let file = file_with("businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n");
        let reg = TenantRegistry::new(file).unwrap();
        let cfg = reg.get_config("acme").unwrap();
        assert_eq!(cfg.display_name, "Acme");
    }

    #[test]
    fn appointment_booking_enabled_without_calendar_is_rejected() {
        let file = file_with(
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n",
        );
        // appointment_booking_enabled defaults to true, and no calendar is set.
        let err = TenantRegistry::new(file).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingFeatureConfig { feature: "appointment_booking", .. }
        ));
    }

    #[test]
    fn emergency_enabled_without_transfer_number_is_rejected() {
        let file = file_with(
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n    feature_flags:\n      appointment_booking_enabled: false\n      emergency_enabled: true\n",
        );
        let err = TenantRegistry::new(file).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingFeatureConfig { feature: "emergency_transfer", .. }
        ));
    }

    #[test]
    fn tenant_ids_are_sorted() {
        let file = file_with(
            "businesses:\n  zeta:\n    display_name: Z\n    prompt: hi\n    feature_flags:\n      appointment_booking_enabled: false\n  acme:\n    display_name: A\n    prompt: hi\n    feature_flags:\n      appointment_booking_enabled: false\n",
        );
        let reg = TenantRegistry::new(file).unwrap();
        assert_eq!(reg.tenant_ids(), vec!["acme".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn reload_atomically_replaces_registry_contents() {
        let reg = TenantRegistry::empty();
        let file = file_with(
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi\n    feature_flags:\n      appointment_booking_enabled: false\n    incoming_numbers: [\"+15551110001\"]\n",
        );
        reg.reload(file).unwrap();
        assert!(reg.is_initialized());
        assert_eq!(reg.business_id_from_phone("+15551110001").unwrap(), "acme");
    }
}
