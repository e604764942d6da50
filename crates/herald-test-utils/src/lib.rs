// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Herald workspace.
//!
//! Scripted doubles for the two external collaborators, so processor and
//! scheduler tests run fast and deterministic with no network.

pub mod mock_dialer;
pub mod mock_strategist;

pub use mock_dialer::MockDialer;
pub use mock_strategist::{retry_plan, success_plan, MockStrategist};
