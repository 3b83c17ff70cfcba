use reqwest::StatusCode;

/// Failure of a registration or fetch request. Terminal for the interaction
/// that triggered it; the `Display` text is what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum RequestFailure {
    #[error("{message} (HTTP {status})")]
    Rejected { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response from tracking backend: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("tracking number is required")]
    InvalidTrackingNumber,
    #[error("invalid base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
}

impl RequestFailure {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestFailure::Rejected { status, .. } => Some(*status),
            RequestFailure::Transport(e) => e.status(),
            _ => None,
        }
    }
}
