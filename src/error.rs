//! Error types for the studio.

/// Errors that can occur while rendering or relaying requests.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// Login rejected or API key missing/invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Content was blocked by the provider's safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A render is already in flight for this session.
    #[error("a render is already in progress")]
    Busy,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 image data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving a render or reading the auth flag).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StudioError {
    /// Returns true if this failure is key-related and reconnecting the
    /// credential is a sensible recovery action.
    ///
    /// Besides the structured cases, the message text is checked for the
    /// key-related substrings the relay and provider are known to emit.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Api { status, .. } if *status == 401 || *status == 403 => true,
            other => {
                let text = other.to_string();
                text.contains("API Key") || text.contains("401") || text.contains("403")
            }
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
