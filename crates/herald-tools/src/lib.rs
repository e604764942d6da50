// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant-facing tool handlers for the outbound-call pipeline.
//!
//! The realtime assistant invokes these with parsed arguments and speaks
//! the returned text. Both handlers are stateless wrappers over the job
//! store; the call pipeline itself never depends on this crate.

pub mod schedule;
pub mod status;
pub mod when;

pub use schedule::{schedule_outbound_call, ScheduleRequest};
pub use status::{check_scheduled_call_status, StatusQuery};
pub use when::{DateWindow, TimeOfDay};
