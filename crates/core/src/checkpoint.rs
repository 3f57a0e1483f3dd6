//! Durable resume point for an in-progress registration.
//!
//! Once step 1 has created the patient, two entries are written to a [`KeyValueStore`]:
//! the patient identifier and the step marker `"2"`. A later session that finds both
//! resumes directly at step 2. The two entries are always written and removed together.
//!
//! ## Storage port
//!
//! [`KeyValueStore`] is deliberately as small as browser local storage. Two
//! implementations are provided:
//! - [`MemoryStore`] for embedding and tests
//! - [`FileStore`], a single JSON object on disk:
//!
//! ```text
//! <data_dir>/
//!   session.json    # { "psyrec.inProgressPatientId": "77", "psyrec.inProgressStep": "2" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use api_shared::PatientId;

use crate::constants::{
    CHECKPOINT_PATIENT_ID_KEY, CHECKPOINT_STEP_KEY, SESSION_FILENAME, STEP_TWO_MARKER,
};
use crate::error::{PatientError, PatientResult};

/// Minimal string key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PatientResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PatientResult<()>;
    fn remove(&mut self, key: &str) -> PatientResult<()>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PatientResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PatientResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PatientResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file inside a data directory.
///
/// Every write replaces the file through a temporary file and a rename, so a crash never
/// leaves a half-written object behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens (and if needed creates) the data directory.
    pub fn open(data_dir: &Path) -> PatientResult<Self> {
        fs::create_dir_all(data_dir).map_err(PatientError::StorageDirCreation)?;
        Ok(Self {
            path: data_dir.join(SESSION_FILENAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PatientResult<BTreeMap<String, String>> {
        if !self.path.is_file() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(PatientError::FileRead)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(PatientError::Deserialization)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> PatientResult<()> {
        let json = serde_json::to_string_pretty(entries).map_err(PatientError::Serialization)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(PatientError::FileWrite)?;
        fs::rename(&tmp, &self.path).map_err(PatientError::FileWrite)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PatientResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> PatientResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    /// An unparsable file is replaced by an empty object, so removal always succeeds in
    /// leaving the key absent.
    fn remove(&mut self, key: &str) -> PatientResult<()> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(PatientError::Deserialization(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "replacing unreadable checkpoint file");
                return self.write_all(&BTreeMap::new());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// The visible step of the registration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Out-patient card.
    One,
    /// Demographic and social details.
    Two,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::One => 1,
            WizardStep::Two => 2,
        }
    }
}

/// Resume point written after the patient has been created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowCheckpoint {
    pub patient_id: PatientId,
    pub step: WizardStep,
}

/// What [`WorkflowCheckpoint::load`] found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedCheckpoint {
    /// Nothing stored.
    Empty,
    /// Only one of the two entries, or a step marker other than `"2"`.
    Partial,
    /// Both entries present with marker `"2"`.
    Resumable(WorkflowCheckpoint),
}

impl WorkflowCheckpoint {
    /// Checkpoint for a patient that has just been created in step 1.
    pub fn after_step_one(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            step: WizardStep::Two,
        }
    }

    pub fn load(store: &impl KeyValueStore) -> PatientResult<LoadedCheckpoint> {
        let patient_id = store
            .get(CHECKPOINT_PATIENT_ID_KEY)?
            .filter(|v| !v.trim().is_empty());
        let step = store.get(CHECKPOINT_STEP_KEY)?;

        Ok(match (patient_id, step) {
            (None, None) => LoadedCheckpoint::Empty,
            (Some(id), Some(step)) if step.trim() == STEP_TWO_MARKER => {
                LoadedCheckpoint::Resumable(WorkflowCheckpoint {
                    patient_id: PatientId::new(id.trim()),
                    step: WizardStep::Two,
                })
            }
            _ => LoadedCheckpoint::Partial,
        })
    }

    /// Writes both entries. Only step 2 is ever persisted.
    pub fn save(&self, store: &mut impl KeyValueStore) -> PatientResult<()> {
        if self.step != WizardStep::Two {
            return Err(PatientError::InvalidInput(
                "only a step 2 checkpoint can be saved".into(),
            ));
        }
        store.set(CHECKPOINT_PATIENT_ID_KEY, self.patient_id.as_str())?;
        store.set(CHECKPOINT_STEP_KEY, STEP_TWO_MARKER)
    }

    /// Removes both entries.
    pub fn clear(store: &mut impl KeyValueStore) -> PatientResult<()> {
        store.remove(CHECKPOINT_STEP_KEY)?;
        store.remove(CHECKPOINT_PATIENT_ID_KEY)
    }
}
