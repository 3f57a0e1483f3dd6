//! Step 2: demographic and social details, doctor assignment and the first visit.

use api_shared::{
    ApiError, AssignPatientReq, CreateVisitReq, PatientId, UpdatePatientReq, VisitType,
};
use chrono::NaiveDate;

use super::Wizard;
use crate::api::PatientApi;
use crate::checkpoint::{KeyValueStore, WorkflowCheckpoint};
use crate::draft::{DraftField, PatientDraft};
use crate::error::{FieldErrors, WizardError, WizardResult};
use crate::numeric::{parse_optional_decimal, parse_optional_int};
use crate::other_field::{resolve_choice, OtherCapableField, OtherFieldState};

/// Result of a secondary call made after the patient record was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Skipped,
    Done,
    Failed(ApiError),
}

impl SideEffect {
    pub fn is_done(&self) -> bool {
        matches!(self, SideEffect::Done)
    }
}

/// What happened when step 2 completed. The front-end navigates away on receiving this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTwoOutcome {
    pub patient_id: PatientId,
    pub assignment: SideEffect,
    pub visit: SideEffect,
    /// `false` if the resume checkpoint could not be removed from storage.
    pub checkpoint_cleared: bool,
}

pub fn validate_step_two(draft: &PatientDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(doctor) = draft.get(DraftField::AssignedDoctor) {
        if parse_optional_int(Some(doctor)).is_none() {
            errors.insert(DraftField::AssignedDoctor, "Select a doctor from the list");
        }
    }
    errors
}

/// Builds the update-patient body, resolving every "other"-capable field.
///
/// `local` supplies the free-text state held outside the draft; it is consulted only when
/// the draft carries no override.
pub fn build_update_request(
    draft: &PatientDraft,
    local: impl Fn(OtherCapableField) -> OtherFieldState,
) -> UpdatePatientReq {
    let choice = |field: OtherCapableField| {
        let state = local(field);
        resolve_choice(
            draft.get(field.choice()),
            draft.get(field.companion()),
            Some(state.text.as_str()),
        )
    };
    let int = |field: DraftField| parse_optional_int(draft.get(field));
    let decimal = |field: DraftField| parse_optional_decimal(draft.get(field));

    UpdatePatientReq {
        marital_status: draft.text(DraftField::MaritalStatus),
        year_of_marriage: int(DraftField::YearOfMarriage),
        no_of_children_male: int(DraftField::NoOfChildrenMale),
        no_of_children_female: int(DraftField::NoOfChildrenFemale),
        occupation: choice(OtherCapableField::Occupation),
        education: draft.text(DraftField::Education),
        patient_income: decimal(DraftField::PatientIncome),
        family_income: decimal(DraftField::FamilyIncome),
        religion: choice(OtherCapableField::Religion),
        family_type: choice(OtherCapableField::FamilyType),
        locality: choice(OtherCapableField::Locality),
        head_name: draft.text(DraftField::HeadName),
        head_age: int(DraftField::HeadAge),
        head_relationship: choice(OtherCapableField::HeadRelationship),
        head_education: draft.text(DraftField::HeadEducation),
        head_occupation: draft.text(DraftField::HeadOccupation),
        head_income: decimal(DraftField::HeadIncome),
        distance_from_hospital: decimal(DraftField::DistanceFromHospital),
        mobility: choice(OtherCapableField::Mobility),
        referred_by: choice(OtherCapableField::ReferredBy),
    }
}

impl<A: PatientApi, S: KeyValueStore> Wizard<A, S> {
    /// Completes the registration with today's date for the first visit.
    pub fn submit_step_two(&mut self) -> WizardResult<StepTwoOutcome> {
        self.submit_step_two_on(chrono::Local::now().date_naive())
    }

    /// Completes the registration.
    ///
    /// Only the patient update can fail the submission. Doctor assignment and visit creation
    /// are best-effort: the patient record is already saved by then, so their failures are
    /// logged and reported in the outcome. On completion the checkpoint and the draft are
    /// cleared and the wizard returns to step 1.
    pub fn submit_step_two_on(&mut self, visit_date: NaiveDate) -> WizardResult<StepTwoOutcome> {
        let Some(patient_id) = self.patient_id.clone() else {
            return Err(WizardError::MissingPatientId);
        };

        let errors = validate_step_two(self.draft.draft());
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }
        self.field_errors = FieldErrors::new();

        let req = build_update_request(self.draft.draft(), |f| {
            self.other_fields.get(&f).cloned().unwrap_or_default()
        });
        if let Err(e) = self.api.update_patient(&patient_id, &req) {
            tracing::error!(patient_id = %patient_id, error = %e, "update patient failed");
            return Err(WizardError::Request(e));
        }

        let assignment = match parse_optional_int(self.draft.get(DraftField::AssignedDoctor)) {
            Some(doctor_id) => {
                let req = AssignPatientReq {
                    patient_id: patient_id.clone(),
                    assigned_doctor: doctor_id,
                    room_no: self.draft.draft().text(DraftField::AssignedRoom),
                };
                match self.api.assign_patient(&req) {
                    Ok(()) => SideEffect::Done,
                    Err(e) => {
                        tracing::warn!(patient_id = %patient_id, doctor_id, error = %e, "doctor assignment failed");
                        SideEffect::Failed(e)
                    }
                }
            }
            None => SideEffect::Skipped,
        };

        let visit_req = CreateVisitReq {
            patient_id: patient_id.clone(),
            visit_date,
            visit_type: VisitType::FirstVisit,
        };
        let visit = match self.api.create_visit(&visit_req) {
            Ok(()) => SideEffect::Done,
            Err(e) => {
                tracing::warn!(patient_id = %patient_id, error = %e, "creating first visit failed");
                SideEffect::Failed(e)
            }
        };

        let checkpoint_cleared = match WorkflowCheckpoint::clear(&mut self.store) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to clear registration checkpoint");
                false
            }
        };
        self.reset_session();
        tracing::info!(patient_id = %patient_id, "registration complete");

        Ok(StepTwoOutcome {
            patient_id,
            assignment,
            visit,
            checkpoint_cleared,
        })
    }
}
