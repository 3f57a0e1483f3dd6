use std::collections::BTreeMap;

use api_shared::ApiError;

use crate::draft::DraftField;

/// Errors from storage and configuration plumbing.
#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write checkpoint file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read checkpoint file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize checkpoint: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize checkpoint: {0}")]
    Deserialization(serde_json::Error),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Field-keyed validation messages, ordered by field for stable display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<DraftField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: DraftField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: DraftField) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DraftField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Why a wizard step did not complete.
///
/// `Display` is the summary shown to the user; per-field detail is carried by
/// [`WizardError::Validation`].
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("please fix {} highlighted field(s) before continuing", .0.len())]
    Validation(FieldErrors),

    #[error("still checking whether the CR number is already registered, please wait")]
    CrCheckPending,

    #[error("this CR number is already registered to another patient, please enter a different one")]
    DuplicateCrNumber,

    #[error("{}", .0.user_message())]
    Request(ApiError),

    #[error("patient ID not found, please complete the out-patient card first")]
    MissingPatientId,

    #[error("step {attempted} cannot be submitted while the form is on step {current}")]
    WrongStep { current: u8, attempted: u8 },

    #[error("failed to save progress: {0}")]
    Checkpoint(#[from] PatientError),
}

pub type WizardResult<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_summary_counts_fields() {
        let mut errors = FieldErrors::new();
        errors.insert(DraftField::Name, "Name is required");
        errors.insert(DraftField::Sex, "Sex is required");
        let err = WizardError::Validation(errors);
        assert_eq!(
            err.to_string(),
            "please fix 2 highlighted field(s) before continuing"
        );
    }

    #[test]
    fn test_request_error_shows_backend_message() {
        let err = WizardError::Request(ApiError::Rejected {
            status: 400,
            message: "Age out of range".into(),
        });
        assert_eq!(err.to_string(), "Age out of range");
    }
}
