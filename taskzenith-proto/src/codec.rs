//! JSON encoding and decoding for task store payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::ErrorBody;
use crate::task::{Task, TaskPatch};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The payload was empty where a document was expected.
    #[error("empty payload")]
    Empty,
}

/// Encodes any wire value as a JSON byte vector.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes any wire value from JSON bytes.
///
/// # Errors
///
/// Returns `CodecError::Empty` for an empty slice, or
/// `CodecError::Serialization` if the bytes are not a valid document.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::Empty);
    }
    serde_json::from_slice(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a task list as returned by a project's task route.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    decode(bytes)
}

/// Decodes a single task record.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_task(bytes: &[u8]) -> Result<Task, CodecError> {
    decode(bytes)
}

/// Encodes a partial task update.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_patch(patch: &TaskPatch) -> Result<Vec<u8>, CodecError> {
    encode(patch)
}

/// Extracts the `message` of an error response, if the body has one.
#[must_use]
pub fn error_message(bytes: &[u8]) -> Option<String> {
    decode::<ErrorBody>(bytes).ok().map(|body| body.message)
}
