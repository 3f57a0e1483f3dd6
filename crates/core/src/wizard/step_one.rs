//! Step 1: the out-patient card.

use api_shared::{CreatePatientReq, PatientId};
use psyrec_types::{CrNumber, NonEmptyText, TextError};

use super::Wizard;
use crate::api::PatientApi;
use crate::checkpoint::{KeyValueStore, WizardStep, WorkflowCheckpoint};
use crate::cr_guard::DUPLICATE_CR_MESSAGE;
use crate::draft::{DraftField, DraftPatch, PatientDraft};
use crate::error::{FieldErrors, WizardError, WizardResult};
use crate::numeric::parse_optional_int;

/// Local checks that must pass before the patient is created.
///
/// `cr_error` is the uniqueness error currently shown for the CR number, if any.
pub fn validate_step_one(draft: &PatientDraft, cr_error: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if NonEmptyText::new(draft.get(DraftField::Name).unwrap_or_default()).is_err() {
        errors.insert(DraftField::Name, "Name is required");
    }
    if draft.get(DraftField::Sex).is_none() {
        errors.insert(DraftField::Sex, "Sex is required");
    }
    if draft.get(DraftField::Age).is_none() {
        errors.insert(DraftField::Age, "Age is required");
    }

    if let Some(cr_no) = draft.get(DraftField::CrNo) {
        if let Err(TextError::TooShort { min }) = CrNumber::parse(cr_no) {
            errors.insert(
                DraftField::CrNo,
                format!("CR number must be at least {min} characters"),
            );
        } else if let Some(message) = cr_error {
            errors.insert(DraftField::CrNo, message);
        }
    }

    errors
}

/// Builds the create-patient body from a draft that passed [`validate_step_one`].
pub fn build_create_request(draft: &PatientDraft) -> Result<CreatePatientReq, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = NonEmptyText::new(draft.get(DraftField::Name).unwrap_or_default())
        .map_err(|_| errors.insert(DraftField::Name, "Name is required"))
        .ok();
    let cr_no = match draft.get(DraftField::CrNo) {
        Some(raw) => CrNumber::parse(raw)
            .map_err(|e| errors.insert(DraftField::CrNo, e.to_string()))
            .ok(),
        None => None,
    };

    let Some(name) = name.filter(|_| errors.is_empty()) else {
        return Err(errors);
    };

    Ok(CreatePatientReq {
        name,
        sex: draft.text(DraftField::Sex).unwrap_or_default(),
        age: parse_optional_int(draft.get(DraftField::Age)),
        cr_no,
        psy_no: draft.text(DraftField::PsyNo),
        date: draft.text(DraftField::Date),
        contact_number: draft.text(DraftField::ContactNumber),
        father_name: draft.text(DraftField::FatherName),
        category: draft.text(DraftField::Category),
        address_line: draft.text(DraftField::AddressLine),
        city: draft.text(DraftField::City),
        district: draft.text(DraftField::District),
        state: draft.text(DraftField::State),
        country: draft.text(DraftField::Country),
        pin_code: parse_optional_int(draft.get(DraftField::PinCode)),
    })
}

impl<A: PatientApi, S: KeyValueStore> Wizard<A, S> {
    /// Creates the patient from the out-patient card and moves on to step 2.
    ///
    /// Nothing is sent when validation fails or a CR-number check is still running. When the
    /// backend reports the CR number as a duplicate, the CR field is cleared so it must be
    /// re-entered; any other failure leaves the draft untouched for a retry.
    pub fn submit_step_one(&mut self) -> WizardResult<PatientId> {
        if self.step != WizardStep::One {
            return Err(WizardError::WrongStep {
                current: self.step.number(),
                attempted: 1,
            });
        }
        if self.cr_guard.is_checking() {
            return Err(WizardError::CrCheckPending);
        }

        let errors = validate_step_one(self.draft.draft(), self.cr_guard.error());
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }
        let req = match build_create_request(self.draft.draft()) {
            Ok(req) => req,
            Err(errors) => {
                self.field_errors = errors.clone();
                return Err(WizardError::Validation(errors));
            }
        };
        self.field_errors = FieldErrors::new();

        let res = match self.api.create_patient(&req) {
            Ok(res) => res,
            Err(e) if e.is_duplicate_cr_number() => {
                tracing::warn!(error = %e, "create patient rejected: duplicate CR number");
                self.draft.update(DraftPatch::new().clear(DraftField::CrNo));
                self.cr_guard.reset();
                self.field_errors.insert(DraftField::CrNo, DUPLICATE_CR_MESSAGE);
                return Err(WizardError::DuplicateCrNumber);
            }
            Err(e) => {
                tracing::error!(error = %e, "create patient failed");
                return Err(WizardError::Request(e));
            }
        };

        let patient_id = res.data.patient.id;
        tracing::info!(patient_id = %patient_id, "patient created, continuing to step 2");

        if let Err(e) = WorkflowCheckpoint::after_step_one(patient_id.clone()).save(&mut self.store)
        {
            // The patient exists; the session can continue without a resume point.
            tracing::warn!(error = %e, "failed to persist registration checkpoint");
        }
        self.patient_id = Some(patient_id.clone());
        self.step = WizardStep::Two;

        Ok(patient_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use api_shared::ApiError;

    use super::*;
    use crate::checkpoint::{LoadedCheckpoint, MemoryStore};
    use crate::draft::DraftStore;
    use crate::testing::{Call, FakeApi};

    const DELAY: Duration = Duration::from_millis(500);

    fn asha_draft() -> DraftStore {
        let mut draft = DraftStore::new();
        draft.update(
            DraftPatch::new()
                .set(DraftField::Name, "Asha")
                .set(DraftField::Sex, "F")
                .set(DraftField::Age, "34")
                .set(DraftField::CrNo, "CR100")
                .set(DraftField::City, "Chandigarh"),
        );
        draft
    }

    #[test]
    fn test_validate_reports_missing_required_fields() {
        let errors = validate_step_one(&PatientDraft::default(), None);
        assert!(errors.contains(DraftField::Name));
        assert!(errors.contains(DraftField::Sex));
        assert!(errors.contains(DraftField::Age));
        assert!(!errors.contains(DraftField::CrNo), "CR number is optional");
    }

    #[test]
    fn test_validate_rejects_short_cr_number() {
        let mut draft = asha_draft();
        draft.update(DraftPatch::new().set(DraftField::CrNo, "C1"));
        let errors = validate_step_one(draft.draft(), None);
        assert_eq!(
            errors.get(DraftField::CrNo),
            Some("CR number must be at least 3 characters")
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_validate_whitespace_name_is_missing() {
        let mut draft = asha_draft();
        draft.update(DraftPatch::new().set(DraftField::Name, "   "));
        assert!(validate_step_one(draft.draft(), None).contains(DraftField::Name));
    }

    #[test]
    fn test_build_request_parses_numbers_to_null() {
        let mut draft = asha_draft();
        draft.update(
            DraftPatch::new()
                .set(DraftField::Age, "thirty")
                .set(DraftField::PinCode, ""),
        );
        let req = build_create_request(draft.draft()).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json["age"].is_null());
        assert!(json["pin_code"].is_null());
        assert_eq!(json["cr_no"], "CR100");
        assert!(json["contact_number"].is_null());
    }

    #[test]
    fn test_submit_creates_patient_and_persists_checkpoint() {
        let api = FakeApi::new().with_created_id(77);
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();

        let id = wizard.submit_step_one().expect("submit should succeed");

        assert_eq!(id, PatientId::from(77));
        assert_eq!(wizard.step(), WizardStep::Two);
        assert_eq!(wizard.patient_id(), Some(&PatientId::from(77)));
        assert!(matches!(
            WorkflowCheckpoint::load(wizard.store()).unwrap(),
            LoadedCheckpoint::Resumable(cp) if cp.patient_id == PatientId::from(77)
        ));
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::CreatePatient(req) if req.name.as_str() == "Asha"));
    }

    #[test]
    fn test_validation_failure_makes_no_network_call() {
        let api = FakeApi::new();
        let mut wizard =
            Wizard::mount(&api, MemoryStore::new(), DraftStore::new(), DELAY).unwrap();

        let err = wizard.submit_step_one().expect_err("empty draft is invalid");

        assert!(matches!(err, WizardError::Validation(ref e) if e.len() == 3));
        assert!(wizard.field_errors().contains(DraftField::Name));
        assert!(api.calls().is_empty());
        assert_eq!(wizard.step(), WizardStep::One);
    }

    #[test]
    fn test_submit_deferred_while_cr_check_in_flight() {
        let api = FakeApi::new();
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();
        let t0 = Instant::now();
        wizard.input_cr_number("CR200", t0);
        let ticket = wizard.begin_cr_check(t0 + DELAY).expect("check should be due");

        let err = wizard.submit_step_one().expect_err("submit should wait");
        assert!(matches!(err, WizardError::CrCheckPending));
        assert!(api.calls().is_empty());

        wizard.finish_cr_check(ticket, Ok(false));
        assert!(wizard.submit_step_one().is_ok());
    }

    #[test]
    fn test_known_duplicate_blocks_submit() {
        let api = FakeApi::new().with_existing_cr("CR100");
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();
        let t0 = Instant::now();
        wizard.input_cr_number("CR100", t0);
        wizard.poll_cr_check(t0 + DELAY);

        let err = wizard.submit_step_one().expect_err("duplicate should block");

        assert!(matches!(err, WizardError::Validation(ref e) if e.contains(DraftField::CrNo)));
        assert_eq!(api.calls(), vec![Call::CrExists("CR100".into())]);
    }

    #[test]
    fn test_duplicate_cr_from_backend_clears_only_cr_field() {
        let api = FakeApi::new().with_create_error(ApiError::Rejected {
            status: 500,
            message: r#"duplicate key value violates unique constraint "patients_cr_no_key""#
                .into(),
        });
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();
        let before = wizard.draft().clone();

        let err = wizard.submit_step_one().expect_err("backend rejects");

        assert!(matches!(err, WizardError::DuplicateCrNumber));
        assert_eq!(wizard.draft().get(DraftField::CrNo), None);
        assert_eq!(
            wizard.field_errors().get(DraftField::CrNo),
            Some(DUPLICATE_CR_MESSAGE)
        );
        for field in DraftField::ALL.iter().filter(|f| **f != DraftField::CrNo) {
            assert_eq!(wizard.draft().get(*field), before.get(*field), "{field}");
        }
        assert_eq!(wizard.step(), WizardStep::One);
        assert!(wizard.store().is_empty());
    }

    #[test]
    fn test_generic_failure_keeps_draft_for_retry() {
        let api = FakeApi::new().with_create_error(ApiError::Rejected {
            status: 400,
            message: "Invalid category".into(),
        });
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();
        let before = wizard.draft().clone();

        let err = wizard.submit_step_one().expect_err("backend rejects");

        assert_eq!(err.to_string(), "Invalid category");
        assert_eq!(wizard.draft(), &before);
        assert_eq!(wizard.step(), WizardStep::One);
    }

    #[test]
    fn test_step_one_rejected_once_on_step_two() {
        let api = FakeApi::new().with_created_id(5);
        let mut wizard = Wizard::mount(&api, MemoryStore::new(), asha_draft(), DELAY).unwrap();
        wizard.submit_step_one().unwrap();

        let err = wizard.submit_step_one().expect_err("already on step 2");
        assert!(matches!(
            err,
            WizardError::WrongStep {
                current: 2,
                attempted: 1
            }
        ));
        assert_eq!(api.calls().len(), 1);
    }
}
