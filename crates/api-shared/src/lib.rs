//! # API Shared
//!
//! The JSON contract between the registration workflow and the hospital REST backend.
//!
//! Contains:
//! - Request/response bodies for every endpoint the workflow consumes (`types` module)
//! - [`PatientId`], the backend's patient identifier
//! - [`ApiError`], the error every backend call reports
//!
//! Used by `psyrec-core` (the `PatientApi` port) and `api-client` (the HTTP implementation).

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;
