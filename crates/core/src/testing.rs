//! In-memory [`PatientApi`] that records every call.

use std::cell::RefCell;

use api_shared::{
    ApiError, AssignPatientReq, CreatePatientData, CreatePatientReq, CreatePatientRes,
    CreateVisitReq, DoctorSummary, PatientId, PatientRecord, UpdatePatientReq,
};

use crate::api::PatientApi;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreatePatient(CreatePatientReq),
    UpdatePatient(PatientId, UpdatePatientReq),
    AssignPatient(AssignPatientReq),
    CrExists(String),
    CreateVisit(CreateVisitReq),
    ListDoctors(u32, u32),
}

#[derive(Debug)]
pub struct FakeApi {
    calls: RefCell<Vec<Call>>,
    created_id: u64,
    create_error: Option<ApiError>,
    update_error: Option<ApiError>,
    assign_error: Option<ApiError>,
    visit_error: Option<ApiError>,
    cr_check_error: bool,
    existing_cr: Vec<String>,
    doctors: Vec<DoctorSummary>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            created_id: 1,
            create_error: None,
            update_error: None,
            assign_error: None,
            visit_error: None,
            cr_check_error: false,
            existing_cr: Vec::new(),
            doctors: Vec::new(),
        }
    }

    pub fn with_created_id(mut self, id: u64) -> Self {
        self.created_id = id;
        self
    }

    pub fn with_create_error(mut self, err: ApiError) -> Self {
        self.create_error = Some(err);
        self
    }

    pub fn with_update_error(mut self, err: ApiError) -> Self {
        self.update_error = Some(err);
        self
    }

    pub fn with_assign_error(mut self, err: ApiError) -> Self {
        self.assign_error = Some(err);
        self
    }

    pub fn with_visit_error(mut self, err: ApiError) -> Self {
        self.visit_error = Some(err);
        self
    }

    pub fn with_cr_check_error(mut self) -> Self {
        self.cr_check_error = true;
        self
    }

    pub fn with_existing_cr(mut self, cr_no: &str) -> Self {
        self.existing_cr.push(cr_no.to_string());
        self
    }

    pub fn with_doctor(mut self, id: i64, name: &str, role: &str) -> Self {
        self.doctors.push(DoctorSummary {
            id,
            name: name.to_string(),
            role: role.to_string(),
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn outcome(err: &Option<ApiError>) -> Result<(), ApiError> {
        match err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl PatientApi for FakeApi {
    fn create_patient(&self, req: &CreatePatientReq) -> Result<CreatePatientRes, ApiError> {
        self.record(Call::CreatePatient(req.clone()));
        Self::outcome(&self.create_error)?;
        Ok(CreatePatientRes {
            data: CreatePatientData {
                patient: PatientRecord {
                    id: PatientId::from(self.created_id),
                    name: Some(req.name.to_string()),
                    cr_no: req.cr_no.as_ref().map(|c| c.to_string()),
                },
            },
        })
    }

    fn update_patient(&self, id: &PatientId, req: &UpdatePatientReq) -> Result<(), ApiError> {
        self.record(Call::UpdatePatient(id.clone(), req.clone()));
        Self::outcome(&self.update_error)
    }

    fn assign_patient(&self, req: &AssignPatientReq) -> Result<(), ApiError> {
        self.record(Call::AssignPatient(req.clone()));
        Self::outcome(&self.assign_error)
    }

    fn cr_number_exists(&self, cr_no: &str) -> Result<bool, ApiError> {
        self.record(Call::CrExists(cr_no.to_string()));
        if self.cr_check_error {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(self.existing_cr.iter().any(|c| c == cr_no))
    }

    fn create_visit(&self, req: &CreateVisitReq) -> Result<(), ApiError> {
        self.record(Call::CreateVisit(req.clone()));
        Self::outcome(&self.visit_error)
    }

    fn list_doctors(&self, page: u32, limit: u32) -> Result<Vec<DoctorSummary>, ApiError> {
        self.record(Call::ListDoctors(page, limit));
        Ok(self.doctors.clone())
    }
}
