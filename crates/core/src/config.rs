//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the wizard and
//! the REST client. Library code never reads environment variables itself; binaries read
//! them and hand the raw values to the parsing helpers below.

use crate::constants::{DEFAULT_CR_DEBOUNCE_MS, DEFAULT_TIMEOUT_SECS};
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_base_url: String,
    api_token: Option<String>,
    request_timeout: Duration,
    data_dir: PathBuf,
    cr_debounce: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The base URL must be an `http` or `https` URL; a trailing slash is dropped.
    /// A blank token is treated as no token.
    pub fn new(
        api_base_url: impl Into<String>,
        api_token: Option<String>,
        request_timeout: Duration,
        data_dir: PathBuf,
        cr_debounce: Duration,
    ) -> PatientResult<Self> {
        let api_base_url = api_base_url.into().trim().trim_end_matches('/').to_string();
        if api_base_url.is_empty() {
            return Err(PatientError::InvalidInput(
                "api base url cannot be empty".into(),
            ));
        }
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(PatientError::InvalidInput(format!(
                "api base url must start with http:// or https:// (got {api_base_url})"
            )));
        }
        if request_timeout.is_zero() {
            return Err(PatientError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            api_base_url,
            api_token: api_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            request_timeout,
            data_dir,
            cr_debounce,
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cr_debounce(&self) -> Duration {
        self.cr_debounce
    }
}

fn parse_u64_env_value(name: &str, value: Option<String>) -> PatientResult<Option<u64>> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                PatientError::InvalidInput(format!("{name} must be a whole number (got {v})"))
            })
        })
        .transpose()
}

/// Parse the request timeout (seconds) from an optional string value.
///
/// If `value` is `None` or blank, returns the default.
pub fn timeout_from_env_value(value: Option<String>) -> PatientResult<Duration> {
    let secs = parse_u64_env_value("PSYREC_TIMEOUT_SECS", value)?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    Ok(Duration::from_secs(secs))
}

/// Parse the CR-number debounce delay (milliseconds) from an optional string value.
///
/// If `value` is `None` or blank, returns the default.
pub fn cr_debounce_from_env_value(value: Option<String>) -> PatientResult<Duration> {
    let ms =
        parse_u64_env_value("PSYREC_CR_DEBOUNCE_MS", value)?.unwrap_or(DEFAULT_CR_DEBOUNCE_MS);
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: &str) -> PatientResult<CoreConfig> {
        CoreConfig::new(
            url,
            Some("  ".into()),
            Duration::from_secs(5),
            PathBuf::from("data"),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_new_normalises_url_and_token() {
        let cfg = cfg("http://localhost:5000/ ").unwrap();
        assert_eq!(cfg.api_base_url(), "http://localhost:5000");
        assert_eq!(cfg.api_token(), None);
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        assert!(matches!(
            cfg("localhost:5000"),
            Err(PatientError::InvalidInput(_))
        ));
        assert!(matches!(cfg(""), Err(PatientError::InvalidInput(_))));
    }

    #[test]
    fn test_env_value_parsers_default_and_validate() {
        assert_eq!(
            timeout_from_env_value(None).unwrap(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert_eq!(
            cr_debounce_from_env_value(Some(" 250 ".into())).unwrap(),
            Duration::from_millis(250)
        );
        assert!(timeout_from_env_value(Some("soon".into())).is_err());
    }
}
