// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cliniq integration tests.
//!
//! Provides a mock automation engine and a harness that wires the full stack
//! together for fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`TestHarness`] - temp store, proxy service, and router with token minting
//! - [`MockEngine`] - wiremock-backed automation engine that checks the API key

pub mod harness;
pub mod mock_engine;

pub use harness::TestHarness;
pub use mock_engine::MockEngine;
