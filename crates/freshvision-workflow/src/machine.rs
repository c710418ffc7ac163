//! Workflow state machine with explicit legal transitions.

use std::fmt;
use std::sync::Arc;

use freshvision_capture::{CaptureError, PreviewStore};
use freshvision_core::{
    AuxiliaryField, MediaFile, MediaSlot, ValidationError, VariantConfig, inputs_populated,
    validate,
};
use freshvision_submit::{
    NETWORK_ERROR_MESSAGE, ServerErrorCause, SubmissionClient, SubmissionOutcome,
};
use thiserror::Error;

use crate::correlate::{ResultCorrelator, WorkflowResult};

/// Enumerated state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Some required input is missing.
    Idle,
    /// All required inputs are present; not yet validated.
    Ready,
    /// One request is outstanding.
    Submitting,
    /// Last cycle produced a result.
    Success,
    /// Last cycle produced an error.
    Error,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Failure category of a workflow cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs failed client-side validation.
    Validation,
    /// Service unreachable.
    Network,
    /// Service rejected the request.
    Server,
    /// Service answered with an undecodable success body.
    Decode,
}

impl ErrorKind {
    /// Category shown to the user; decode failures read as server errors.
    pub fn display_kind(&self) -> ErrorKind {
        match self {
            Self::Decode => Self::Server,
            other => *other,
        }
    }
}

/// Error carried by the `Error` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowError {
    /// Failure category.
    pub kind: ErrorKind,
    /// Single human-readable message.
    pub message: String,
}

impl WorkflowError {
    fn validation(error: &ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: error.to_string(),
        }
    }
}

/// Current outcome; always consistent with [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    /// No result and no error.
    None,
    /// Result of the last cycle.
    Result(&'a WorkflowResult),
    /// Error of the last cycle.
    Error(&'a WorkflowError),
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Ready,
    Submitting { token: u64, stale: bool },
    Success(WorkflowResult),
    Error(WorkflowError),
}

impl Phase {
    fn tag(&self) -> WorkflowState {
        match self {
            Self::Idle => WorkflowState::Idle,
            Self::Ready => WorkflowState::Ready,
            Self::Submitting { .. } => WorkflowState::Submitting,
            Self::Success(_) => WorkflowState::Success,
            Self::Error(_) => WorkflowState::Error,
        }
    }
}

/// Inputs frozen at the moment a submission began.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    token: u64,
    slots: Vec<MediaSlot>,
    fields: Vec<AuxiliaryField>,
}

impl SubmissionTicket {
    /// Monotonic submission token.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Slot values as of submission start.
    pub fn slots(&self) -> &[MediaSlot] {
        &self.slots
    }

    /// Field values as of submission start.
    pub fn fields(&self) -> &[AuxiliaryField] {
        &self.fields
    }
}

/// Why a submit action did not start a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    /// Required inputs are missing; state is unchanged.
    #[error("{0}")]
    Incomplete(ValidationError),
    /// Inputs failed validation; the workflow moved to `Error`.
    #[error("{0}")]
    Invalid(ValidationError),
    /// A request is already outstanding.
    #[error("a submission is already in flight")]
    InFlight,
    /// Cycle already settled; edit an input to start a new one.
    #[error("submit is not accepted in state {0}")]
    NotReady(WorkflowState),
}

/// What happened to a completed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Outcome became the current outcome.
    Applied(WorkflowState),
    /// Inputs changed while in flight; response dropped.
    Discarded(WorkflowState),
    /// Ticket does not belong to the outstanding submission.
    Ignored,
}

/// Invalid edit target or preview failure.
#[derive(Debug, Error)]
pub enum InputError {
    /// Slot name not declared by the variant.
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    /// Field name not declared by the variant.
    #[error("unknown field: {0}")]
    UnknownField(String),
    /// Preview allocation failure.
    #[error("preview failure: {0}")]
    Preview(#[from] CaptureError),
}

/// Orchestrates validation, submission, and correlation for one variant.
///
/// # Invariants
/// - Exactly one of {no outcome, result, error} is current, encoded by the
///   internal phase.
/// - At most one submission is outstanding.
/// - Every slot holds at most one live preview.
pub struct WorkflowStateMachine {
    variant_name: String,
    slots: Vec<MediaSlot>,
    fields: Vec<AuxiliaryField>,
    phase: Phase,
    next_token: u64,
    correlator: ResultCorrelator,
    previews: Arc<dyn PreviewStore>,
}

impl WorkflowStateMachine {
    /// Creates a machine in `Idle` with empty inputs.
    pub fn new(
        variant: &VariantConfig,
        correlator: ResultCorrelator,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        let (slots, fields) = variant.instantiate();
        Self {
            variant_name: variant.name().to_string(),
            slots,
            fields,
            phase: Phase::Idle,
            next_token: 0,
            correlator,
            previews,
        }
    }

    /// Current state tag.
    pub fn state(&self) -> WorkflowState {
        self.phase.tag()
    }

    /// Current outcome.
    pub fn outcome(&self) -> Outcome<'_> {
        match &self.phase {
            Phase::Success(result) => Outcome::Result(result),
            Phase::Error(error) => Outcome::Error(error),
            _ => Outcome::None,
        }
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[MediaSlot] {
        &self.slots
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[AuxiliaryField] {
        &self.fields
    }

    /// Replaces a slot's file and preview.
    ///
    /// The content is not inspected. The superseded preview is released.
    ///
    /// # Errors
    /// Returns [`InputError::UnknownSlot`] for undeclared slots and
    /// [`InputError::Preview`] when no preview can be allocated; inputs are
    /// untouched in both cases.
    pub fn select_file(&mut self, slot_name: &str, file: MediaFile) -> Result<(), InputError> {
        let index = self.slot_index(slot_name)?;
        let preview = self.previews.allocate(&file)?;
        if let Some(superseded) = self.slots[index].replace(file, preview) {
            self.previews.release(&superseded);
        }

        tracing::info!(
            stage = "workflow",
            action = "select_file",
            slot = slot_name,
            "media selected"
        );
        self.on_edit();
        Ok(())
    }

    /// Removes a slot's file and releases its preview.
    ///
    /// # Errors
    /// Returns [`InputError::UnknownSlot`] for undeclared slots.
    pub fn clear_slot(&mut self, slot_name: &str) -> Result<(), InputError> {
        let index = self.slot_index(slot_name)?;
        if let Some(removed) = self.slots[index].clear() {
            self.previews.release(&removed);
        }
        self.on_edit();
        Ok(())
    }

    /// Replaces an auxiliary field value. Validation is deferred to submit.
    ///
    /// # Errors
    /// Returns [`InputError::UnknownField`] for undeclared fields.
    pub fn set_field(&mut self, name: &str, raw_value: impl Into<String>) -> Result<(), InputError> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name() == name)
            .ok_or_else(|| InputError::UnknownField(name.to_string()))?;
        field.set_raw_value(raw_value);
        self.on_edit();
        Ok(())
    }

    /// Starts a submission when the workflow is `Ready` and inputs validate.
    ///
    /// # Errors
    /// - [`SubmitRejected::Incomplete`] in `Idle`, naming the missing input.
    /// - [`SubmitRejected::Invalid`] when validation fails in `Ready`; the
    ///   workflow moves to `Error`.
    /// - [`SubmitRejected::InFlight`] while `Submitting`.
    /// - [`SubmitRejected::NotReady`] in `Success` and `Error`.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, SubmitRejected> {
        match &self.phase {
            Phase::Ready => {}
            Phase::Idle => {
                return match validate(&self.slots, &self.fields) {
                    Err(error) => Err(SubmitRejected::Incomplete(error)),
                    Ok(()) => Err(SubmitRejected::NotReady(WorkflowState::Idle)),
                };
            }
            Phase::Submitting { .. } => {
                tracing::debug!(
                    stage = "workflow",
                    action = "submit_rejected",
                    "submission already in flight"
                );
                return Err(SubmitRejected::InFlight);
            }
            other => return Err(SubmitRejected::NotReady(other.tag())),
        }

        if let Err(error) = validate(&self.slots, &self.fields) {
            self.transition(Phase::Error(WorkflowError::validation(&error)));
            return Err(SubmitRejected::Invalid(error));
        }

        self.next_token += 1;
        let token = self.next_token;
        self.transition(Phase::Submitting {
            token,
            stale: false,
        });

        Ok(SubmissionTicket {
            token,
            slots: self.slots.clone(),
            fields: self.fields.clone(),
        })
    }

    /// Applies the outcome of the submission identified by `ticket`.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: SubmissionOutcome,
    ) -> Completion {
        let stale = match self.phase {
            Phase::Submitting { token, stale } if token == ticket.token => stale,
            _ => {
                tracing::debug!(
                    stage = "workflow",
                    action = "completion_ignored",
                    token = ticket.token,
                    "completion does not match outstanding submission"
                );
                return Completion::Ignored;
            }
        };

        if stale {
            tracing::info!(
                stage = "workflow",
                action = "response_discarded",
                token = ticket.token,
                "inputs changed while in flight"
            );
            let next = self.readiness();
            self.transition(next);
            return Completion::Discarded(self.state());
        }

        let next = match outcome {
            SubmissionOutcome::Success(payload) => {
                Phase::Success(self.correlator.correlate(&payload))
            }
            SubmissionOutcome::ServerError(server_error) => Phase::Error(WorkflowError {
                kind: match server_error.cause {
                    ServerErrorCause::Rejected { .. } => ErrorKind::Server,
                    ServerErrorCause::MalformedResponse => ErrorKind::Decode,
                },
                message: server_error.message,
            }),
            SubmissionOutcome::NetworkError => Phase::Error(WorkflowError {
                kind: ErrorKind::Network,
                message: NETWORK_ERROR_MESSAGE.to_string(),
            }),
        };
        self.transition(next);
        Completion::Applied(self.state())
    }

    /// Runs one full cycle: begin, submit through `client`, complete.
    ///
    /// # Errors
    /// Propagates [`SubmitRejected`] from [`Self::begin_submission`]; no
    /// request is issued in that case.
    pub fn run_submission(
        &mut self,
        client: &SubmissionClient,
    ) -> Result<WorkflowState, SubmitRejected> {
        let ticket = self.begin_submission()?;
        let outcome = client.submit(ticket.slots(), ticket.fields());
        self.complete_submission(ticket, outcome);
        Ok(self.state())
    }

    /// Releases every preview and empties all slots.
    ///
    /// An outstanding submission is marked stale so its response is discarded.
    pub fn teardown(&mut self) {
        for slot in &mut self.slots {
            if let Some(preview) = slot.clear() {
                self.previews.release(&preview);
            }
        }
        if let Phase::Submitting { stale, .. } = &mut self.phase {
            *stale = true;
        } else {
            self.phase = Phase::Idle;
        }
    }

    fn slot_index(&self, slot_name: &str) -> Result<usize, InputError> {
        self.slots
            .iter()
            .position(|slot| slot.name() == slot_name)
            .ok_or_else(|| InputError::UnknownSlot(slot_name.to_string()))
    }

    fn readiness(&self) -> Phase {
        if inputs_populated(&self.slots, &self.fields) {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    fn on_edit(&mut self) {
        // Invariant:
        // - An outstanding request keeps the mutual-exclusion guard; the edit
        //   only marks its eventual response as stale.
        if let Phase::Submitting { stale, .. } = &mut self.phase {
            *stale = true;
            return;
        }
        let next = self.readiness();
        self.transition(next);
    }

    fn transition(&mut self, next: Phase) {
        let from = self.phase.tag();
        let to = next.tag();
        self.phase = next;
        if from != to {
            tracing::info!(
                stage = "workflow",
                action = "transition",
                variant = %self.variant_name,
                from = %from,
                to = %to,
                "workflow state changed"
            );
        }
    }
}

impl fmt::Debug for WorkflowStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStateMachine")
            .field("variant", &self.variant_name)
            .field("state", &self.state())
            .field("slots", &self.slots.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl Drop for WorkflowStateMachine {
    fn drop(&mut self) {
        self.teardown();
    }
}
