//! Job ID decoding errors

use thiserror::Error;

use super::IdEncoding;

/// Result type for job ID decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A token that is not a well-formed job ID for the requested encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not decode '{text}' to job ID ({encoding}): {reason}")]
pub struct DecodeError {
    text: String,
    encoding: IdEncoding,
    reason: String,
}

impl DecodeError {
    pub(crate) fn new(text: &str, encoding: IdEncoding, reason: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            encoding,
            reason: reason.into(),
        }
    }

    /// The offending token
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The encoding the token was decoded against
    pub fn encoding(&self) -> IdEncoding {
        self.encoding
    }
}
