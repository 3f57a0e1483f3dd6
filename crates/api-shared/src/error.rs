/// Generic fallback when a failed response carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed. Please try again.";

/// Errors reported by any backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connection refused, timeout, ...).
    #[error("backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered successfully but the body did not match the contract.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds a `Rejected` error from a status and raw response body.
    ///
    /// The message is taken from the body's `message` field, then its `error` field, and
    /// falls back to [`GENERIC_FAILURE_MESSAGE`].
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<crate::ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        ApiError::Rejected { status, message }
    }

    /// Message suitable for showing to clinic staff.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => message,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Whether the backend refused a write because the CR number is already registered.
    ///
    /// The backend surfaces its unique-constraint violation either as HTTP 409 or as a
    /// database "duplicate key" message; in both cases the message names the CR column.
    pub fn is_duplicate_cr_number(&self) -> bool {
        let ApiError::Rejected { status, message } = self else {
            return false;
        };

        let m = message.to_lowercase();
        let names_cr = ["cr_no", "cr number", "cr_number", "cr no"]
            .iter()
            .any(|needle| m.contains(needle));
        let is_duplicate = *status == 409
            || m.contains("duplicate key")
            || m.contains("unique constraint")
            || m.contains("already exists");

        names_cr && is_duplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_prefers_message_field() {
        let err = ApiError::from_response(400, r#"{"message":"Bad age","error":"x"}"#);
        assert_eq!(err.user_message(), "Bad age");
    }

    #[test]
    fn test_from_response_falls_back_to_error_then_generic() {
        let err = ApiError::from_response(500, r#"{"error":"boom"}"#);
        assert_eq!(err.user_message(), "boom");

        let err = ApiError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_duplicate_cr_detected_from_database_message() {
        let err = ApiError::Rejected {
            status: 500,
            message: r#"duplicate key value violates unique constraint "patients_cr_no_key""#
                .into(),
        };
        assert!(err.is_duplicate_cr_number());
    }

    #[test]
    fn test_duplicate_cr_detected_from_conflict_status() {
        let err = ApiError::Rejected {
            status: 409,
            message: "CR number already registered".into(),
        };
        assert!(err.is_duplicate_cr_number());
    }

    #[test]
    fn test_other_conflicts_are_not_duplicate_cr() {
        let err = ApiError::Rejected {
            status: 409,
            message: "psy_no already exists".into(),
        };
        assert!(!err.is_duplicate_cr_number());
        assert!(!ApiError::Transport("cr_no duplicate key".into()).is_duplicate_cr_number());
    }
}
