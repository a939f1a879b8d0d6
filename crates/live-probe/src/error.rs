use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("status field not found (tried {0})")]
    MissingStatusField(String),
    #[error("unrecognized room status: {0}")]
    UnknownStatus(String),
}

impl ProbeError {
    /// Whether the error came from the transport rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::HttpStatus { .. })
    }
}
