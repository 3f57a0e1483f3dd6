//! # Psyrec Core
//!
//! Core workflow logic for registering patients at the psychiatry out-patient department.
//!
//! This crate contains the registration wizard and everything it owns:
//! - The in-progress draft ([`draft`]) and the "other"-field rules ([`other_field`])
//! - Step 1 and step 2 submission ([`wizard`])
//! - The durable resume point and its storage port ([`checkpoint`])
//! - The debounced CR-number uniqueness check ([`cr_guard`])
//!
//! **No transport concerns**: HTTP lives in `api-client`, the wire contract in `api-shared`,
//! and the terminal front-end in `psyrec-cli`. The wizard reaches the backend only through
//! the [`PatientApi`] port.

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod cr_guard;
pub mod draft;
pub mod error;
pub mod numeric;
pub mod other_field;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

pub use api::PatientApi;
pub use checkpoint::{
    FileStore, KeyValueStore, LoadedCheckpoint, MemoryStore, WizardStep, WorkflowCheckpoint,
};
pub use config::CoreConfig;
pub use constants::{DEFAULT_API_URL, DEFAULT_DATA_DIR};
pub use draft::{DraftField, DraftPatch, DraftStore, PatientDraft};
pub use error::{FieldErrors, PatientError, PatientResult, WizardError, WizardResult};
pub use other_field::{OtherCapableField, OtherFieldState};
pub use wizard::{SideEffect, StepTwoOutcome, Wizard};

pub use api_shared;
pub use psyrec_types::{CrNumber, NonEmptyText, TextError};
