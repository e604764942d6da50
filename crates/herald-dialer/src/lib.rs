// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound call execution for the Herald pipeline.
//!
//! Wraps the two third-party HTTP APIs behind the [`CallDialer`] trait:
//! the voice-agent API (create session, poll status, fetch transcript)
//! and the telephony API (place and force-end PSTN calls).
//!
//! [`CallDialer`]: herald_core::CallDialer

pub mod client;
pub mod transcript;
pub mod types;

pub use client::{HttpDialer, MONITORING_TIMEOUT_REASON};
