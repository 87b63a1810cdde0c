// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the external workflow-automation API.
//!
//! Provides [`AutomationClient`], which probes candidate connections during
//! onboarding and forwards authenticated calls for the proxy.

pub mod client;

pub use client::AutomationClient;
