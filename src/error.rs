use std::path::PathBuf;
use thiserror::Error;

/// Failures turning a user-supplied file into an [`ImageAsset`](crate::models::ImageAsset).
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("upload error: {0}")] Upload(String),
    #[error("invalid base64 payload: {0}")] Base64(#[from] base64::DecodeError),
    #[error("malformed data url")] DataUrl,
}

/// Failures talking to the image service. Missing or rejected credentials
/// show up as `Status`, like any other refused request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")] Parse(String),
    #[error("no image data returned")] NoImage,
    #[error("image payload is not valid base64: {0}")] Payload(#[from] EncodingError),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Http(e.to_string())
    }
}
