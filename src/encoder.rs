//! Binary image <-> base64 text.

use std::path::Path;

use base64::Engine;
use bytes::Bytes;
use tracing::debug;

use crate::{error::EncodingError, models::ImageAsset};

const FALLBACK_MIME: &str = "image/png";

/// Reads a local file and encodes it. The returned future resolves once.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<ImageAsset, EncodingError> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await.map_err(|source| EncodingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Ok(encode_bytes(name, Bytes::from(data)))
}

pub fn encode_bytes(file_name: Option<String>, bytes: Bytes) -> ImageAsset {
    let mime = sniff_mime(&bytes);
    debug!(?file_name, mime, size = bytes.len(), "encoded image");
    ImageAsset::new(file_name, mime, bytes)
}

/// Sniffs the image type from magic bytes; unknown data is treated as PNG.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

pub fn decode_base64(mime_type: &str, data: &str) -> Result<ImageAsset, EncodingError> {
    let raw = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    Ok(ImageAsset::new(None, mime_type, Bytes::from(raw)))
}

/// Parses `data:<mime>;base64,<payload>`.
pub fn parse_data_url(url: &str) -> Result<ImageAsset, EncodingError> {
    let rest = url.strip_prefix("data:").ok_or(EncodingError::DataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(EncodingError::DataUrl)?;
    let mime = header.strip_suffix(";base64").ok_or(EncodingError::DataUrl)?;
    let mime = if mime.is_empty() { FALLBACK_MIME } else { mime };
    decode_base64(mime, payload)
}
