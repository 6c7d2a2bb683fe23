use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::errors::ClientError;

/// Encodes raw file bytes as standard (padded) base64 for the `file_input` field.
pub fn encode_file_input(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a `file_input` value back into bytes.
pub fn decode_file_input(encoded: &str) -> Result<Vec<u8>, ClientError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ClientError::validation(format!("invalid base64 file input: {e}")))
}
