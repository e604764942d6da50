// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions implemented by the infrastructure crates.

pub mod dialer;
pub mod strategist;

pub use dialer::CallDialer;
pub use strategist::OutcomeStrategist;
