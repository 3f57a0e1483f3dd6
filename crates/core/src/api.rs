//! The backend port.
//!
//! The wizard only talks to the REST backend through [`PatientApi`]. The HTTP
//! implementation lives in the `api-client` crate; tests use an in-memory fake.

use api_shared::{
    ApiError, AssignPatientReq, CreatePatientReq, CreatePatientRes, CreateVisitReq,
    DoctorSummary, PatientId, UpdatePatientReq,
};

pub trait PatientApi {
    /// `POST` create-patient.
    fn create_patient(&self, req: &CreatePatientReq) -> Result<CreatePatientRes, ApiError>;

    /// `PUT` update-patient.
    fn update_patient(&self, id: &PatientId, req: &UpdatePatientReq) -> Result<(), ApiError>;

    /// `POST` assign-patient to a doctor.
    fn assign_patient(&self, req: &AssignPatientReq) -> Result<(), ApiError>;

    /// `GET` whether a patient with exactly this CR number exists.
    fn cr_number_exists(&self, cr_no: &str) -> Result<bool, ApiError>;

    /// `POST` create-clinical-visit.
    fn create_visit(&self, req: &CreateVisitReq) -> Result<(), ApiError>;

    /// `GET` list-doctors, one page at a time (pages start at 1).
    fn list_doctors(&self, page: u32, limit: u32) -> Result<Vec<DoctorSummary>, ApiError>;
}

impl<T: PatientApi + ?Sized> PatientApi for &T {
    fn create_patient(&self, req: &CreatePatientReq) -> Result<CreatePatientRes, ApiError> {
        (**self).create_patient(req)
    }

    fn update_patient(&self, id: &PatientId, req: &UpdatePatientReq) -> Result<(), ApiError> {
        (**self).update_patient(id, req)
    }

    fn assign_patient(&self, req: &AssignPatientReq) -> Result<(), ApiError> {
        (**self).assign_patient(req)
    }

    fn cr_number_exists(&self, cr_no: &str) -> Result<bool, ApiError> {
        (**self).cr_number_exists(cr_no)
    }

    fn create_visit(&self, req: &CreateVisitReq) -> Result<(), ApiError> {
        (**self).create_visit(req)
    }

    fn list_doctors(&self, page: u32, limit: u32) -> Result<Vec<DoctorSummary>, ApiError> {
        (**self).list_doctors(page, limit)
    }
}
