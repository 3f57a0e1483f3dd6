//! Request and response bodies.
//!
//! Optional fields are always serialised, so a value the user left blank reaches the
//! backend as JSON `null` rather than being omitted or sent as an empty string.

use chrono::NaiveDate;
use psyrec_types::{CrNumber, NonEmptyText};
use serde::{Deserialize, Serialize};

/// Identifier the backend assigns to a patient.
///
/// The backend emits numeric ids, but the value also round-trips through string storage
/// (the resume checkpoint), so both JSON numbers and strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for PatientId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Only canonical digit strings go out as numbers; "007" stays a string.
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(PatientId::from(n)),
            Raw::Text(s) if !s.trim().is_empty() => Ok(PatientId(s.trim().to_string())),
            Raw::Text(_) => Err(serde::de::Error::custom("patient id cannot be empty")),
        }
    }
}

/// Body of `POST /api/patients`: the out-patient card captured in step 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientReq {
    pub name: NonEmptyText,
    pub sex: String,
    pub age: Option<i64>,
    pub cr_no: Option<CrNumber>,
    pub psy_no: Option<String>,
    pub date: Option<String>,
    pub contact_number: Option<String>,
    pub father_name: Option<String>,
    pub category: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pin_code: Option<i64>,
}

/// Patient resource as echoed back by the backend.
///
/// Only the identifier is relied upon; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cr_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientData {
    pub patient: PatientRecord,
}

/// Response of `POST /api/patients`: `{ "data": { "patient": { "id": ... } } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientRes {
    pub data: CreatePatientData,
}

/// Body of `PUT /api/patients/{id}`: demographic and social details captured in step 2.
///
/// Choice fields carry the resolved value: the free-text override when the user picked
/// "other", never the sentinel itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdatePatientReq {
    pub marital_status: Option<String>,
    pub year_of_marriage: Option<i64>,
    pub no_of_children_male: Option<i64>,
    pub no_of_children_female: Option<i64>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub patient_income: Option<f64>,
    pub family_income: Option<f64>,
    pub religion: Option<String>,
    pub family_type: Option<String>,
    pub locality: Option<String>,
    pub head_name: Option<String>,
    pub head_age: Option<i64>,
    pub head_relationship: Option<String>,
    pub head_education: Option<String>,
    pub head_occupation: Option<String>,
    pub head_income: Option<f64>,
    pub distance_from_hospital: Option<f64>,
    pub mobility: Option<String>,
    pub referred_by: Option<String>,
}

/// Body of `POST /api/patients/assign`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignPatientReq {
    pub patient_id: PatientId,
    pub assigned_doctor: i64,
    pub room_no: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    FirstVisit,
}

/// Body of `POST /api/patient-visits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVisitReq {
    pub patient_id: PatientId,
    pub visit_date: NaiveDate,
    pub visit_type: VisitType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrExistsData {
    pub exists: bool,
}

/// Response of `GET /api/patients/cr-exists?cr_no=...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrExistsRes {
    pub data: CrExistsData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDoctorsData {
    pub users: Vec<DoctorSummary>,
}

/// Response of `GET /api/users/doctors?page=&limit=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDoctorsRes {
    pub data: ListDoctorsData,
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
