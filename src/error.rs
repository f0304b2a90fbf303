// src/error.rs
use thiserror::Error;

/// Everything that can go wrong talking to the screener service.
/// The console logs any of these and offers a retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("cannot reach screener service: {0}")]
    Connect(String),
    #[error("screener service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("http error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connect(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no signals to export")]
    Empty,
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode metadata: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("unknown parameter: {0}")]
    Unknown(String),
    #[error("'{input}' is not a valid {kind} for {name}")]
    InvalidValue {
        name: String,
        kind: &'static str,
        input: String,
    },
}
