// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `herald-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use herald_core::types::{
    Attempt, AttemptPatch, AttemptStatus, Job, JobPatch, JobSearchFilter, JobStatus, NewJob,
};
