//! The in-progress registration draft.
//!
//! A [`DraftStore`] is the single source of truth for every field of the registration
//! form across both steps. It is an owned value threaded through the wizard rather than
//! process-wide state, so the workflow can be driven and tested without a front-end.
//!
//! The store does no validation: [`DraftStore::update`] is a plain shallow merge.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every field of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    // Identity and contact (out-patient card, step 1)
    Name,
    Sex,
    Age,
    CrNo,
    PsyNo,
    Date,
    ContactNumber,
    FatherName,
    Category,
    AddressLine,
    City,
    District,
    State,
    Country,
    PinCode,

    // Demographic and social (step 2)
    MaritalStatus,
    YearOfMarriage,
    NoOfChildrenMale,
    NoOfChildrenFemale,
    Occupation,
    Education,
    PatientIncome,
    FamilyIncome,
    Religion,
    FamilyType,
    Locality,
    HeadName,
    HeadAge,
    HeadRelationship,
    HeadEducation,
    HeadOccupation,
    HeadIncome,
    DistanceFromHospital,
    Mobility,
    ReferredBy,
    AssignedDoctor,
    AssignedRoom,

    // Free-text companions used when the matching choice is "other"
    OccupationOther,
    FamilyTypeOther,
    LocalityOther,
    ReligionOther,
    HeadRelationshipOther,
    MobilityOther,
    ReferredByOther,
}

/// Which part of the form a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    IdentityContact,
    DemographicSocial,
    OtherOverride,
}

impl DraftField {
    pub const ALL: [DraftField; 44] = [
        DraftField::Name,
        DraftField::Sex,
        DraftField::Age,
        DraftField::CrNo,
        DraftField::PsyNo,
        DraftField::Date,
        DraftField::ContactNumber,
        DraftField::FatherName,
        DraftField::Category,
        DraftField::AddressLine,
        DraftField::City,
        DraftField::District,
        DraftField::State,
        DraftField::Country,
        DraftField::PinCode,
        DraftField::MaritalStatus,
        DraftField::YearOfMarriage,
        DraftField::NoOfChildrenMale,
        DraftField::NoOfChildrenFemale,
        DraftField::Occupation,
        DraftField::Education,
        DraftField::PatientIncome,
        DraftField::FamilyIncome,
        DraftField::Religion,
        DraftField::FamilyType,
        DraftField::Locality,
        DraftField::HeadName,
        DraftField::HeadAge,
        DraftField::HeadRelationship,
        DraftField::HeadEducation,
        DraftField::HeadOccupation,
        DraftField::HeadIncome,
        DraftField::DistanceFromHospital,
        DraftField::Mobility,
        DraftField::ReferredBy,
        DraftField::AssignedDoctor,
        DraftField::AssignedRoom,
        DraftField::OccupationOther,
        DraftField::FamilyTypeOther,
        DraftField::LocalityOther,
        DraftField::ReligionOther,
        DraftField::HeadRelationshipOther,
        DraftField::MobilityOther,
        DraftField::ReferredByOther,
    ];

    /// Wire name of the field, as used in request bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Sex => "sex",
            DraftField::Age => "age",
            DraftField::CrNo => "cr_no",
            DraftField::PsyNo => "psy_no",
            DraftField::Date => "date",
            DraftField::ContactNumber => "contact_number",
            DraftField::FatherName => "father_name",
            DraftField::Category => "category",
            DraftField::AddressLine => "address_line",
            DraftField::City => "city",
            DraftField::District => "district",
            DraftField::State => "state",
            DraftField::Country => "country",
            DraftField::PinCode => "pin_code",
            DraftField::MaritalStatus => "marital_status",
            DraftField::YearOfMarriage => "year_of_marriage",
            DraftField::NoOfChildrenMale => "no_of_children_male",
            DraftField::NoOfChildrenFemale => "no_of_children_female",
            DraftField::Occupation => "occupation",
            DraftField::Education => "education",
            DraftField::PatientIncome => "patient_income",
            DraftField::FamilyIncome => "family_income",
            DraftField::Religion => "religion",
            DraftField::FamilyType => "family_type",
            DraftField::Locality => "locality",
            DraftField::HeadName => "head_name",
            DraftField::HeadAge => "head_age",
            DraftField::HeadRelationship => "head_relationship",
            DraftField::HeadEducation => "head_education",
            DraftField::HeadOccupation => "head_occupation",
            DraftField::HeadIncome => "head_income",
            DraftField::DistanceFromHospital => "distance_from_hospital",
            DraftField::Mobility => "mobility",
            DraftField::ReferredBy => "referred_by",
            DraftField::AssignedDoctor => "assigned_doctor",
            DraftField::AssignedRoom => "assigned_room",
            DraftField::OccupationOther => "occupation_other",
            DraftField::FamilyTypeOther => "family_type_other",
            DraftField::LocalityOther => "locality_other",
            DraftField::ReligionOther => "religion_other",
            DraftField::HeadRelationshipOther => "head_relationship_other",
            DraftField::MobilityOther => "mobility_other",
            DraftField::ReferredByOther => "referred_by_other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn group(self) -> FieldGroup {
        use DraftField::*;
        match self {
            Name | Sex | Age | CrNo | PsyNo | Date | ContactNumber | FatherName | Category
            | AddressLine | City | District | State | Country | PinCode => {
                FieldGroup::IdentityContact
            }
            OccupationOther | FamilyTypeOther | LocalityOther | ReligionOther
            | HeadRelationshipOther | MobilityOther | ReferredByOther => FieldGroup::OtherOverride,
            _ => FieldGroup::DemographicSocial,
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field values of the in-progress registration. A missing key means "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientDraft(BTreeMap<DraftField, String>);

impl PatientDraft {
    /// Value of a field, with blank strings reported as absent.
    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0
            .get(&field)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Trimmed, owned value of a field; blank reads as `None`.
    pub fn text(&self, field: DraftField) -> Option<String> {
        self.get(field).map(|v| v.trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A partial update: `Some` sets a field, `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch(Vec<(DraftField, Option<String>)>);

impl DraftPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: DraftField, value: impl Into<String>) -> Self {
        self.0.push((field, Some(value.into())));
        self
    }

    pub fn clear(mut self, field: DraftField) -> Self {
        self.0.push((field, None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(DraftField, Option<String>)> for DraftPatch {
    fn from_iter<I: IntoIterator<Item = (DraftField, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Owner of the registration draft.
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    draft: PatientDraft,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing draft, e.g. values kept from earlier in the same session.
    pub fn with_draft(draft: PatientDraft) -> Self {
        Self { draft }
    }

    pub fn draft(&self) -> &PatientDraft {
        &self.draft
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.draft.get(field)
    }

    /// Shallow merge. Fields not named in `patch` are left as they are.
    pub fn update(&mut self, patch: DraftPatch) {
        for (field, value) in patch.0 {
            match value {
                Some(v) => {
                    self.draft.0.insert(field, v);
                }
                None => {
                    self.draft.0.remove(&field);
                }
            }
        }
    }

    /// Back to the empty initial shape.
    pub fn reset(&mut self) {
        self.draft = PatientDraft::default();
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_merges_without_touching_other_fields() {
        let mut store = DraftStore::new();
        store.update(
            DraftPatch::new()
                .set(DraftField::Name, "Asha")
                .set(DraftField::Sex, "F"),
        );
        store.update(DraftPatch::new().set(DraftField::Age, "34"));

        assert_eq!(store.get(DraftField::Name), Some("Asha"));
        assert_eq!(store.get(DraftField::Sex), Some("F"));
        assert_eq!(store.get(DraftField::Age), Some("34"));
    }

    #[test]
    fn test_update_clear_removes_field() {
        let mut store = DraftStore::new();
        store.update(DraftPatch::new().set(DraftField::CrNo, "CR100"));
        store.update(DraftPatch::new().clear(DraftField::CrNo));
        assert_eq!(store.get(DraftField::CrNo), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let mut store = DraftStore::new();
        store.update(DraftPatch::new().set(DraftField::City, "   "));
        assert_eq!(store.get(DraftField::City), None);
    }

    #[test]
    fn test_reset_restores_empty_shape() {
        let mut store = DraftStore::new();
        store.update(DraftPatch::new().set(DraftField::Name, "Asha"));
        store.reset();
        assert_eq!(store.draft(), &PatientDraft::default());
    }

    #[test]
    fn test_field_names_match_serde_names() {
        for field in DraftField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
            assert_eq!(DraftField::from_name(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_field_groups() {
        assert_eq!(DraftField::CrNo.group(), FieldGroup::IdentityContact);
        assert_eq!(DraftField::Mobility.group(), FieldGroup::DemographicSocial);
        assert_eq!(
            DraftField::MobilityOther.group(),
            FieldGroup::OtherOverride
        );
    }
}
