//! JSON wire encoding for representations

use crate::error::{ResourceError, Result};
use crate::representation::Representation;

/// Encode a representation into its wire form
pub fn encode(rep: &Representation) -> Result<Vec<u8>> {
    serde_json::to_vec(rep).map_err(|e| ResourceError::Internal(format!("encode failed: {}", e)))
}

/// Decode a representation from its wire form
///
/// Payloads that are not a JSON object are validation errors. Attributes
/// whose value has an unsupported shape (floats, nested objects) are
/// skipped.
pub fn decode(bytes: &[u8]) -> Result<Representation> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Pass a representation through the wire encoding
///
/// Used by in-process transports so peers never share a value that did not
/// survive encoding.
pub fn round_trip(rep: &Representation) -> Result<Representation> {
    decode(&encode(rep)?)
}
