use thiserror::Error;

const GENERIC_FAILURE: &str = "Could not reach the server";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl BackendError {
    /// Builds an API error from a non-success response body, preferring the
    /// backend's `detail` field over the raw text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(detail)) => Some(detail.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        BackendError::Api { status, detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Transport(e) => e.status().map(|s| s.as_u16()),
            BackendError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Message suitable for showing to the doctor verbatim.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { detail, .. } => detail.clone(),
            BackendError::Transport(_) | BackendError::Decode(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_field_is_preferred() {
        let error = BackendError::from_response(400, r#"{"detail": "This period is locked and cannot be edited"}"#);

        assert_eq!(error.status(), Some(400));
        assert_eq!(error.user_message(), "This period is locked and cannot be edited");
    }

    #[test]
    fn test_missing_detail_falls_back_to_status() {
        let error = BackendError::from_response(500, "Internal Server Error");

        assert_eq!(error.user_message(), "Request failed with status 500");
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_structured_detail_is_stringified() {
        let error = BackendError::from_response(422, r#"{"detail": [{"msg": "field required"}]}"#);

        assert!(error.user_message().contains("field required"));
    }
}
