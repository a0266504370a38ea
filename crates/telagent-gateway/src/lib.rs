// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Carrier media endpoint, media bridge, realtime session, per-call actor,
//! and post-call notifier (C1-C3, C5, C7) for the telagent voice gateway.

mod bridge;
mod call;
mod carrier;
mod gateway;
mod notifier;
mod realtime;
mod security;

pub use gateway::run;
