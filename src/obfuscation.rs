//! Reversible transport encoding for credentials and tokens
//!
//! Credentials and bearer tokens travel between the console and the relay as
//! base64 strings so the literal secrets never land in client-side network
//! logs. This is a format transform only — it is NOT encryption and provides
//! no confidentiality guarantee.

use base64::{engine::general_purpose, Engine as _};

use crate::models::CredentialPair;

/// Errors from decoding an obfuscated value
///
/// Malformed input collapses into a single generic variant on purpose: the
/// codec has no error recovery and callers only need "this did not decode".
#[derive(Debug, thiserror::Error)]
pub enum ObfuscationError {
    #[error("malformed obfuscated value")]
    Malformed,
}

/// Encode a credential pair for transport: base64 over its JSON form
#[must_use]
pub fn encode_credentials(credentials: &CredentialPair) -> String {
    // CredentialPair serialization cannot fail: two plain string fields
    let json = serde_json::to_string(credentials).unwrap_or_default();
    general_purpose::STANDARD.encode(json.as_bytes())
}

/// Decode a transport-encoded credential pair
///
/// # Errors
///
/// Returns `ObfuscationError::Malformed` if the input is not valid base64,
/// not valid UTF-8, or not the expected JSON shape.
pub fn decode_credentials(encoded: &str) -> Result<CredentialPair, ObfuscationError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| ObfuscationError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| ObfuscationError::Malformed)
}

/// Encode a bare bearer token for transport
#[must_use]
pub fn encode_token(token: &str) -> String {
    general_purpose::STANDARD.encode(token.as_bytes())
}

/// Decode a transport-encoded bearer token
///
/// # Errors
///
/// Returns `ObfuscationError::Malformed` if the input is not valid base64 or
/// the decoded bytes are not UTF-8.
pub fn decode_token(encoded: &str) -> Result<String, ObfuscationError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| ObfuscationError::Malformed)?;
    String::from_utf8(bytes).map_err(|_| ObfuscationError::Malformed)
}
