//! Error types for the job client.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures talking to the analysis server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The server answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// User-facing failures of the job life cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error("Invalid file format: {name}. Supported formats: MP4, AVI, MOV, MKV, WMV, FLV, WEBM")]
    InvalidFormat { name: String },

    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Status check failed: {0}")]
    PollTransportError(String),

    /// Carries the server message untouched.
    #[error("{0}")]
    JobFailed(String),

    #[error("No analysis job available")]
    NoActiveJob,

    #[error("Failed to read file: {0}")]
    Io(String),
}

impl JobError {
    /// Only transport hiccups while polling leave the job running.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, JobError::PollTransportError(_))
    }
}
