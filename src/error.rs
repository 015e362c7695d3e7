use reqwest::header::InvalidHeaderValue;

pub(crate) const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// A non-success HTTP response, normalized. Displays the message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: u16,
    pub message: String,
}

impl TransportError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Builds the error from a raw error body.
    ///
    /// The body is expected to be JSON with a string `detail` field. Anything
    /// else (empty body, invalid JSON, missing or non-string `detail`, empty
    /// string) falls back to the generic message. Never fails.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("detail")
                    .and_then(|detail| detail.as_str())
                    .map(ToOwned::to_owned)
            })
            .filter(|detail| !detail.is_empty());

        Self::new(
            status,
            detail.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        )
    }
}

/// Bytes that cannot be decoded as UTF-8, even with boundary buffering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 sequence at byte {offset} of response body")]
    InvalidSequence { offset: u64 },
    #[error("response body ended inside a multi-byte character ({pending} byte(s) pending)")]
    Truncated { pending: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bearer token is not a valid header value")]
    InvalidCredential(#[from] InvalidHeaderValue),
    #[error("invalid run request: {0}")]
    Validation(String),
    #[error("run cancelled")]
    Cancelled,
}

impl ClientError {
    /// HTTP status of a normalized transport failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => Some(err.status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
