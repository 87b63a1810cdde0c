// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Onboarding and authenticated proxying for stored automation credentials.
//!
//! [`ProxyService`] ties the credential store, the cipher, and the upstream
//! client together. Callers are already authenticated when they get here.

pub mod onboarding;
pub mod path;
pub mod proxy;
pub mod recording;
pub mod service;

pub use onboarding::ConnectInput;
pub use recording::register_metrics;
pub use service::ProxyService;
