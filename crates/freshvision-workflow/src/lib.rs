#![warn(missing_docs)]
//! # freshvision-workflow
//!
//! ## Purpose
//! Drives one product-analysis workflow from input selection to a displayed
//! result or error.
//!
//! ## Responsibilities
//! - Hold the slots and fields of the active variant.
//! - Enforce legal transitions between `Idle`, `Ready`, `Submitting`,
//!   `Success`, and `Error`.
//! - Guard against concurrent submissions and stale responses.
//! - Join successful predictions with the reference catalog.
//!
//! ## Data flow
//! `select_file`/`set_field` -> readiness recomputed -> `begin_submission`
//! freezes inputs -> [`freshvision_submit::SubmissionClient`] ->
//! `complete_submission` -> [`ResultCorrelator`] -> [`WorkflowResult`].
//!
//! ## Ownership and lifetimes
//! The state machine owns its inputs and the previews allocated for them.
//! Previews are released on replacement, on `clear_slot`, and on drop.
//! The catalog is shared read-only behind `Arc`.
//!
//! ## Error model
//! Edit failures return [`InputError`]. Rejected submit actions return
//! [`SubmitRejected`]. Failures of an accepted submission never surface as
//! `Err`; they become the `Error` state carrying a [`WorkflowError`].

mod correlate;
mod machine;

pub use correlate::{LabelDate, ResultCorrelator, ResultField, WorkflowResult};
pub use machine::{
    Completion, ErrorKind, InputError, Outcome, SubmissionTicket, SubmitRejected, WorkflowError,
    WorkflowState, WorkflowStateMachine,
};
