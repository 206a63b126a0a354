//! Error types for the annotation client.
//!
//! None of these ever escape the fire-and-forget operations on
//! [`crate::Annotator`]; they are only returned by the `try_*` variants.

use std::io;

use thiserror::Error;

/// A record could not be encoded because a payload does not fit its length field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A text, name, label or image payload exceeds what its length prefix can carry.
    #[error("{field} too long: {len} bytes (max {max})")]
    FieldTooLong {
        /// Which payload overflowed.
        field: &'static str,
        /// Encoded length of the payload, including any colour sub-record.
        len: usize,
        /// Largest length the field accepts.
        max: usize,
    },
}

/// Failure while emitting a single annotation record.
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// The record was rejected before any byte reached the sink.
    #[error("Failed to encode annotation: {0}")]
    Encode(#[from] EncodeError),
    /// Writing the encoded record failed.
    #[error("Failed to write annotation: {0}")]
    Write(#[source] io::Error),
    /// Flushing the buffered writer failed.
    #[error("Failed to flush annotation sink: {0}")]
    Flush(#[source] io::Error),
    /// Forcing the bytes to storage failed.
    #[error("Failed to sync annotation sink: {0}")]
    Sync(#[source] io::Error),
}

/// A colour string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Not a known colour name, `#rrggbb` or `r,g,b`.
    #[error("Unknown colour: {0}")]
    Unknown(String),
    /// A numeric component was missing or not a byte.
    #[error("Invalid colour component '{component}' in '{input}'")]
    InvalidComponent {
        /// The full input.
        input: String,
        /// The offending component.
        component: String,
    },
}
