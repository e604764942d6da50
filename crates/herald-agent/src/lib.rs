// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Herald job pipeline: processor, scheduler, and notifier.
//!
//! The [`Scheduler`] polls the store on a fixed interval, reclaims stale
//! jobs, and hands at most one due job per cycle to the [`JobProcessor`],
//! which drives the attempt through the dialer and strategist and writes
//! the resulting status. The [`Notifier`] independently surfaces
//! concluded outcomes to the UI webhook until the informed debounce is
//! satisfied.

pub mod notifier;
pub mod processor;
pub mod scheduler;
pub mod shutdown;

pub use notifier::Notifier;
pub use processor::JobProcessor;
pub use scheduler::Scheduler;
pub use shutdown::install_signal_handler;
