use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid store endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// HTTP status for errors reported by the store itself.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            StoreError::HttpRequest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
