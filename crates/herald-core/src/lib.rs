// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald outbound-call pipeline.
//!
//! This crate provides the shared error type, the job/attempt domain
//! model, and the adapter traits implemented by the infrastructure
//! crates (dialer, strategist). Nothing here performs I/O.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use traits::{CallDialer, OutcomeStrategist};
pub use types::{
    ActionPlan, Attempt, AttemptPatch, AttemptStatus, CreatedSession, Job, JobPatch,
    JobSearchFilter, JobStatus, NewJob, NextAction, ObjectiveMetStatus, SessionRequest,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn CallDialer>();
        assert_send_sync::<dyn OutcomeStrategist>();
    }

    #[test]
    fn reexports_are_reachable() {
        let _status = JobStatus::Pending;
        let _attempt_status = AttemptStatus::Initiated;
        let _err = HeraldError::Internal("reachable".into());
    }
}
