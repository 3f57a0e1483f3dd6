//! Constants used throughout the registration core crate.

/// Storage key holding the identifier of the patient created in step 1.
pub const CHECKPOINT_PATIENT_ID_KEY: &str = "psyrec.inProgressPatientId";

/// Storage key holding the step marker.
pub const CHECKPOINT_STEP_KEY: &str = "psyrec.inProgressStep";

/// The only step marker ever persisted.
pub const STEP_TWO_MARKER: &str = "2";

/// Filename of the [`FileStore`](crate::checkpoint::FileStore) object.
pub const SESSION_FILENAME: &str = "session.json";

/// Default directory for the session file when none is configured.
pub const DEFAULT_DATA_DIR: &str = ".psyrec";

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default quiet period before a CR number is checked for uniqueness.
pub const DEFAULT_CR_DEBOUNCE_MS: u64 = 500;

/// Page size used when listing doctors for assignment.
pub const DOCTOR_PAGE_LIMIT: u32 = 100;
