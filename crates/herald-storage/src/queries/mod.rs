// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the jobs and attempts tables.

pub mod attempts;
pub mod jobs;
