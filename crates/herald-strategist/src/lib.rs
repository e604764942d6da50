// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome strategist for the Herald pipeline.
//!
//! After each call attempt the strategist reads the transcript and the
//! job's attempt history and returns a structured verdict: objective
//! met, retry with a revised objective, or fail the job.

pub mod client;
pub mod prompt;

pub use client::OpenAiStrategist;
