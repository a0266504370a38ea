// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod loader;
mod registry;
mod schema;

pub use loader::{load_gateway_config, load_registry};
pub use registry::{RegistryError, TenantRegistry};
pub use schema::*;
