//! # API Client
//!
//! HTTP implementation of the [`PatientApi`] port.
//!
//! Handles:
//! - Endpoint URLs under the configured base URL
//! - Bearer authentication when a token is configured
//! - Mapping transport failures and non-success responses onto [`ApiError`]
//!
//! Uses `api-shared` for the request/response bodies.

#![warn(rust_2018_idioms)]

use api_shared::{
    ApiError, AssignPatientReq, CreatePatientReq, CreatePatientRes, CreateVisitReq,
    CrExistsRes, DoctorSummary, ListDoctorsRes, PatientId, UpdatePatientReq,
};
use psyrec_core::{CoreConfig, PatientApi};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

/// Blocking client for the registration backend.
#[derive(Clone, Debug)]
pub struct RestClient {
    base_url: Url,
    token: Option<String>,
    client: Client,
    timeout_secs: u64,
}

impl RestClient {
    /// Creates a client from the startup configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Transport` if the base URL cannot carry a path or the HTTP client
    /// cannot be built.
    pub fn new(cfg: &CoreConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(cfg.api_base_url())
            .map_err(|e| ApiError::Transport(format!("invalid base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "base url cannot carry a path: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: cfg.api_token().map(str::to_string),
            client,
            timeout_secs: cfg.request_timeout().as_secs(),
        })
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorised(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn execute(&self, rb: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorised(rb).send().map_err(|e| {
            if e.is_connect() {
                ApiError::Transport(format!("cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                ApiError::Transport(format!("request timed out after {}s", self.timeout_secs))
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "backend returned an error");
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        Ok(response)
    }

    fn execute_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, ApiError> {
        self.execute(rb)?
            .json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl PatientApi for RestClient {
    fn create_patient(&self, req: &CreatePatientReq) -> Result<CreatePatientRes, ApiError> {
        let url = self.endpoint(&["api", "patients"]);
        self.execute_json(self.client.post(url).json(req))
    }

    fn update_patient(&self, id: &PatientId, req: &UpdatePatientReq) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "patients", id.as_str()]);
        self.execute(self.client.put(url).json(req)).map(drop)
    }

    fn assign_patient(&self, req: &AssignPatientReq) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "patients", "assign"]);
        self.execute(self.client.post(url).json(req)).map(drop)
    }

    fn cr_number_exists(&self, cr_no: &str) -> Result<bool, ApiError> {
        let url = self.endpoint(&["api", "patients", "cr-exists"]);
        let res: CrExistsRes = self.execute_json(self.client.get(url).query(&[("cr_no", cr_no)]))?;
        Ok(res.data.exists)
    }

    fn create_visit(&self, req: &CreateVisitReq) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "patient-visits"]);
        self.execute(self.client.post(url).json(req)).map(drop)
    }

    fn list_doctors(&self, page: u32, limit: u32) -> Result<Vec<DoctorSummary>, ApiError> {
        let url = self.endpoint(&["api", "users", "doctors"]);
        let res: ListDoctorsRes =
            self.execute_json(self.client.get(url).query(&[("page", page), ("limit", limit)]))?;
        Ok(res.data.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn client(base: &str) -> RestClient {
        let cfg = CoreConfig::new(
            base,
            None,
            Duration::from_secs(5),
            PathBuf::from("data"),
            Duration::from_millis(500),
        )
        .unwrap();
        RestClient::new(&cfg).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let c = client("http://localhost:5000/emr/");
        assert_eq!(
            c.endpoint(&["api", "patients"]).as_str(),
            "http://localhost:5000/emr/api/patients"
        );
    }

    #[test]
    fn test_endpoint_encodes_identifier_segment() {
        let c = client("http://localhost:5000");
        let id = PatientId::new("a/b c");
        assert_eq!(
            c.endpoint(&["api", "patients", id.as_str()]).as_str(),
            "http://localhost:5000/api/patients/a%2Fb%20c"
        );
    }
}
