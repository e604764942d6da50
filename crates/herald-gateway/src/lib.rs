// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP ingestion and monitoring surface for the Herald pipeline.
//!
//! Accepts new call requests (manual form submission or programmatic
//! POST), lists jobs for the monitoring UI, and exposes per-job attempt
//! detail. The scheduler consumes what this surface inserts; nothing
//! here touches the external call providers.

pub mod auth;
pub mod handlers;
pub mod scheduling;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
