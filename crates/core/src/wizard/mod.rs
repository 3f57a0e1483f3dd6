//! The two-step patient registration wizard.
//!
//! [`Wizard`] owns everything the registration page needs between events: the draft, the
//! visible step, the patient identifier once created, the per-field "other" state and the
//! CR-number guard. It is driven by discrete calls (field edits, polls, submits) and talks
//! to the outside world only through a [`PatientApi`] and a [`KeyValueStore`].
//!
//! ## Flow
//!
//! ```text
//! mount ──► step 1 ──submit_step_one──► create patient ──► checkpoint {id, "2"} ──► step 2
//!   │                                                                                │
//!   └── checkpoint {id, "2"} found ─────────────────────────────────────────────────►│
//!                                                                                    ▼
//!              step 1 ◄── clear checkpoint, reset draft ◄── update, assign, visit ◄── submit_step_two
//! ```

mod step_one;
mod step_two;

pub use step_one::{build_create_request, validate_step_one};
pub use step_two::{build_update_request, validate_step_two, SideEffect, StepTwoOutcome};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use api_shared::{ApiError, DoctorSummary, PatientId};

use crate::api::PatientApi;
use crate::checkpoint::{KeyValueStore, LoadedCheckpoint, WizardStep, WorkflowCheckpoint};
use crate::cr_guard::{CrCheckTicket, CrNumberGuard};
use crate::draft::{DraftField, DraftPatch, DraftStore, PatientDraft};
use crate::error::{FieldErrors, WizardResult};
use crate::other_field::{derive_other_field_state, OtherCapableField, OtherFieldState};

pub struct Wizard<A, S> {
    api: A,
    store: S,
    draft: DraftStore,
    step: WizardStep,
    patient_id: Option<PatientId>,
    other_fields: BTreeMap<OtherCapableField, OtherFieldState>,
    cr_guard: CrNumberGuard,
    field_errors: FieldErrors,
}

impl<A: PatientApi, S: KeyValueStore> Wizard<A, S> {
    /// Sets the wizard up, resuming at step 2 when the store holds a complete checkpoint.
    ///
    /// `draft` is whatever the session already holds; it is shown as-is. No network call is
    /// made. A checkpoint with only one of its two entries, or one that cannot be read, is
    /// cleared and the wizard starts at step 1.
    pub fn mount(
        api: A,
        mut store: S,
        draft: DraftStore,
        cr_debounce: Duration,
    ) -> WizardResult<Self> {
        let loaded = WorkflowCheckpoint::load(&store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "registration checkpoint is unreadable");
            LoadedCheckpoint::Partial
        });
        let (step, patient_id) = match loaded {
            LoadedCheckpoint::Resumable(checkpoint) => {
                tracing::info!(patient_id = %checkpoint.patient_id, "resuming registration at step 2");
                (checkpoint.step, Some(checkpoint.patient_id))
            }
            LoadedCheckpoint::Partial => {
                tracing::warn!("discarding incomplete registration checkpoint");
                if let Err(e) = WorkflowCheckpoint::clear(&mut store) {
                    tracing::warn!(error = %e, "failed to discard registration checkpoint");
                }
                (WizardStep::One, None)
            }
            LoadedCheckpoint::Empty => (WizardStep::One, None),
        };

        let mut wizard = Self {
            api,
            store,
            draft,
            step,
            patient_id,
            other_fields: BTreeMap::new(),
            cr_guard: CrNumberGuard::new(cr_debounce),
            field_errors: FieldErrors::new(),
        };
        wizard.sync_other_fields();
        Ok(wizard)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn patient_id(&self) -> Option<&PatientId> {
        self.patient_id.as_ref()
    }

    pub fn draft(&self) -> &PatientDraft {
        self.draft.draft()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn other_field_state(&self, field: OtherCapableField) -> OtherFieldState {
        self.other_fields.get(&field).cloned().unwrap_or_default()
    }

    /// Uniqueness error for the CR number currently entered, if any.
    pub fn cr_error(&self) -> Option<&str> {
        self.cr_guard.error()
    }

    pub fn is_checking_cr(&self) -> bool {
        self.cr_guard.is_checking()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sets a single field, routing "other"-capable choices and their companions
    /// through the synchronisation rules.
    pub fn set_field(&mut self, field: DraftField, value: &str) {
        if let Some(choice) = OtherCapableField::from_choice(field) {
            self.set_choice(choice, value);
            return;
        }
        if let Some(choice) = OtherCapableField::ALL
            .iter()
            .copied()
            .find(|f| f.companion() == field)
        {
            self.set_other_text(choice, value);
            return;
        }
        if field == DraftField::CrNo {
            self.input_cr_number(value, Instant::now());
            return;
        }
        self.field_errors.remove(field);
        self.draft.update(DraftPatch::new().set(field, value));
    }

    /// Selects a value for an "other"-capable choice field.
    ///
    /// Picking anything but the sentinel hides the free-text input and clears the companion
    /// override in the draft.
    pub fn set_choice(&mut self, field: OtherCapableField, value: &str) {
        let state = derive_other_field_state(Some(value), self.draft.get(field.companion()));
        let mut patch = DraftPatch::new().set(field.choice(), value);
        if !state.show {
            patch = patch.clear(field.companion());
        }
        self.draft.update(patch);
        self.field_errors.remove(field.choice());
        self.other_fields.insert(field, state);
    }

    /// Types into the free-text input of an "other"-capable field.
    ///
    /// Updates local text and the draft override together. Ignored while the input is
    /// hidden, since a companion value is only meaningful alongside the sentinel.
    pub fn set_other_text(&mut self, field: OtherCapableField, text: &str) -> bool {
        let state = self.other_fields.entry(field).or_default();
        if !state.show {
            tracing::debug!(?field, "ignoring override text while choice is not \"other\"");
            return false;
        }
        state.text = text.to_string();
        self.draft.update(DraftPatch::new().set(field.companion(), text));
        true
    }

    /// Records a keystroke in the CR number input.
    pub fn input_cr_number(&mut self, value: &str, now: Instant) {
        self.field_errors.remove(DraftField::CrNo);
        self.draft.update(DraftPatch::new().set(DraftField::CrNo, value));
        self.cr_guard.on_input(value, now);
    }

    /// Starts the CR-number check if its quiet period has elapsed.
    ///
    /// For front-ends that run the request themselves; pair with [`Self::finish_cr_check`].
    pub fn begin_cr_check(&mut self, now: Instant) -> Option<CrCheckTicket> {
        self.cr_guard.poll(now)
    }

    /// Applies the result of a check started with [`Self::begin_cr_check`].
    pub fn finish_cr_check(&mut self, ticket: CrCheckTicket, result: Result<bool, ApiError>) {
        match result {
            Ok(exists) => {
                self.cr_guard.complete(ticket, exists);
            }
            Err(e) => {
                tracing::warn!(cr_no = %ticket.value(), error = %e, "CR number check failed");
                self.cr_guard.fail(ticket);
            }
        }
    }

    /// Runs a due CR-number check against the backend. Returns whether a request was made.
    pub fn poll_cr_check(&mut self, now: Instant) -> bool {
        let Some(ticket) = self.begin_cr_check(now) else {
            return false;
        };
        let result = self.api.cr_number_exists(ticket.value());
        self.finish_cr_check(ticket, result);
        true
    }

    /// One page of doctors available for assignment.
    pub fn doctors(&self, page: u32, limit: u32) -> Result<Vec<DoctorSummary>, ApiError> {
        self.api.list_doctors(page, limit)
    }

    /// Abandons the registration: clears the checkpoint and the draft, back to step 1.
    pub fn cancel(&mut self) -> WizardResult<()> {
        WorkflowCheckpoint::clear(&mut self.store)?;
        self.reset_session();
        tracing::info!("registration cancelled");
        Ok(())
    }

    fn reset_session(&mut self) {
        self.draft.reset();
        self.other_fields.clear();
        self.cr_guard.reset();
        self.field_errors = FieldErrors::new();
        self.patient_id = None;
        self.step = WizardStep::One;
    }

    fn sync_other_fields(&mut self) {
        for field in OtherCapableField::ALL {
            let state = derive_other_field_state(
                self.draft.get(field.choice()),
                self.draft.get(field.companion()),
            );
            self.other_fields.insert(field, state);
        }
    }
}
