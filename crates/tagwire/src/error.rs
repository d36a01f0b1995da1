//! Error types for tagwire writers and readers.

use std::io;

use thiserror::Error;

use crate::grammar::ContainerKind;

/// Broad classification of an [`Error`].
///
/// Invalid arguments and malformed structure on the write side are
/// programmer errors. Decode and quota errors are data errors raised while
/// reading untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller passed a value the encoding cannot represent.
    InvalidArgument,
    /// A call or token sequence violates the object/array grammar.
    MalformedStructure,
    /// Input bytes are truncated or internally inconsistent.
    Decode,
    /// Input declares a size larger than the caller allows.
    QuotaExceeded,
    /// The underlying sink or source failed.
    Io,
}

impl ErrorKind {
    /// Returns a short name for the kind (e.g., "decode").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::MalformedStructure => "malformed-structure",
            ErrorKind::Decode => "decode",
            ErrorKind::QuotaExceeded => "quota-exceeded",
            ErrorKind::Io => "io",
        }
    }
}

/// Error raised by any tagwire writer or reader.
#[derive(Debug, Error)]
pub enum Error {
    // === Invalid argument ===
    #[error("member key {key} must be a positive integer")]
    InvalidMemberKey { key: i32 },

    #[error("token value {token} must be a negative integer")]
    InvalidTokenValue { token: i32 },

    #[error("length {length} must be a non-negative integer")]
    NegativeLength { length: i32 },

    #[error("{field} length {len} exceeds the encodable maximum {max}")]
    LengthTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    // === Malformed structure ===
    #[error("{operation} called with no open container")]
    NoOpenContainer { operation: &'static str },

    #[error("{operation} expected an open {expected}, found an open {found}")]
    ContainerMismatch {
        operation: &'static str,
        expected: ContainerKind,
        found: ContainerKind,
    },

    #[error("{operation} is not valid here: {reason}")]
    InvalidPosition {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    // === Decode ===
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("packed integer exceeds maximum length (5 bytes)")]
    PackedIntTooLong,

    #[error("packed integer overflow (magnitude exceeds i32)")]
    PackedIntOverflow,

    #[error("{context} byte count {len} is not valid")]
    InvalidNumericLength { context: &'static str, len: usize },

    #[error("decoded value does not fit in {context}")]
    NumberOutOfRange { context: &'static str },

    #[error("invalid number literal {text:?} for {context}")]
    InvalidNumber { context: &'static str, text: String },

    #[error("number literal exceeds maximum length {max}")]
    NumberTooLong { max: usize },

    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("invalid escape sequence in {context}")]
    InvalidEscape { context: &'static str },

    #[error("unexpected byte 0x{byte:02x} while reading {context}")]
    UnexpectedByte { byte: u8, context: &'static str },

    #[error("member key {text:?} is not a positive decimal integer")]
    InvalidMemberKeyText { text: String },

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("guid payload has {len} bytes (expected 16)")]
    InvalidGuidLength { len: usize },

    #[error("tick count {ticks} is out of range")]
    TicksOutOfRange { ticks: i64 },

    // === Quota exceeded ===
    #[error("{field} length {len} exceeds quota {quota}")]
    QuotaExceeded {
        field: &'static str,
        len: usize,
        quota: usize,
    },

    #[error("nesting depth exceeds maximum {max}")]
    NestingTooDeep { max: usize },

    // === I/O ===
    #[error("stream error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMemberKey { .. }
            | Error::InvalidTokenValue { .. }
            | Error::NegativeLength { .. }
            | Error::LengthTooLarge { .. } => ErrorKind::InvalidArgument,

            Error::NoOpenContainer { .. }
            | Error::ContainerMismatch { .. }
            | Error::InvalidPosition { .. }
            | Error::UnexpectedToken { .. } => ErrorKind::MalformedStructure,

            Error::QuotaExceeded { .. } | Error::NestingTooDeep { .. } => ErrorKind::QuotaExceeded,

            Error::Io(_) => ErrorKind::Io,

            _ => ErrorKind::Decode,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Maps a `read_exact` failure, turning a short read into a decode error.
pub(crate) fn map_read_error(err: io::Error, context: &'static str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof { context }
    } else {
        Error::Io(err)
    }
}
