//! Error types for model file manipulation
//!
//! Every fallible operation in this crate returns [`ModelResult`]. Variants
//! carry enough context (section names, expected vs. actual sizes, stored
//! vs. computed checksums) to diagnose a broken file without re-running.

use crate::msgpack::MsgPackError;
use std::io;
use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Error types for model file manipulation
#[derive(Debug, Error)]
pub enum ModelError {
    /// The input is not a model file (bad magic, truncated header, missing
    /// JSON section, unknown format)
    #[error("invalid model format: {0}")]
    InvalidFormat(String),

    /// A section is shorter than the size declared in the header
    #[error("EOF detected while reading {section}: expected {expected} bytes, got {actual} bytes")]
    UnexpectedEof {
        /// Section being read (`system_data` or `user_data`)
        section: &'static str,
        /// Size declared in the header
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// CRC32 stored in the header does not match the file contents
    #[error("CRC32 mismatch: header says {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        stored: u32,
        /// Checksum computed over header, system and user bytes
        computed: u32,
    },

    /// No transformation rule exists for this model and target service
    #[error("this {source_type} model cannot be transformed as {target}")]
    UnsupportedTransformation {
        /// `system.type` of the model being transformed
        source_type: String,
        /// Requested target service
        target: String,
    },

    /// Container bytes could not be decoded onto the declared field list
    #[error("failed to decode container: {0}")]
    Decode(String),

    /// `system.config` is not valid UTF-8 text
    #[error("system config is not valid UTF-8: {0}")]
    ConfigNotText(#[from] std::str::Utf8Error),

    /// `system.config` is not usable for the requested operation
    #[error("invalid system config: {0}")]
    InvalidConfig(String),

    /// JSON model document or config could not be parsed or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `user_raw` is not valid base64
    #[error("invalid base64 in user_raw: {0}")]
    Base64(#[from] base64::DecodeError),

    /// I/O error while reading or writing a stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ModelError {
    /// Shorthand for an `UnsupportedTransformation` error.
    pub fn unsupported(source_type: impl Into<String>, target: impl Into<String>) -> Self {
        ModelError::UnsupportedTransformation {
            source_type: source_type.into(),
            target: target.into(),
        }
    }
}

impl From<MsgPackError> for ModelError {
    fn from(e: MsgPackError) -> Self {
        ModelError::Decode(e.to_string())
    }
}
