use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OAuth token endpoint rejected refresh ({status}): {body}")]
    OAuthRejected { status: StatusCode, body: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("No OAuth credentials available: {0}")]
    MissingCredentials(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;
