use thiserror::Error;

use crate::message::FailureReason;
use crate::page::{RequestToken, VectorPageId};

/// Wire bytes that do not decode to a valid frame or message.
///
/// Always recovered locally: the receiver logs and drops the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    #[error("truncated message")]
    Truncated,
    #[error("read failed: {0}")]
    Io(String),
    #[error("unsupported frame version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown message kind {0}")]
    UnknownKind(u8),
    #[error("unregistered message kind {0}")]
    UnregisteredKind(u8),
    #[error("invalid frame flags {0:#06x}")]
    InvalidFlags(u16),
    #[error("unknown {message} variant tag {tag}")]
    UnknownVariant { message: &'static str, tag: u8 },
    #[error("unknown failure reason code {0}")]
    UnknownReason(u8),
    #[error("failure reason text of {0} bytes exceeds the wire limit")]
    ReasonTooLong(usize),
    #[error("failure reason text is not valid UTF-8")]
    InvalidUtf8,
    #[error("inverted page range [{low}, {high})")]
    InvertedRange { low: u64, high: u64 },
    #[error("body length mismatch: header says {declared}, frame holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
    #[error("CRC32 mismatch: expected {expected:#010x}, got {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
}

impl From<std::io::Error> for MalformedMessage {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => MalformedMessage::Truncated,
            _ => MalformedMessage::Io(err.to_string()),
        }
    }
}

/// A response whose `(page, token)` matches no outstanding request.
///
/// Expected under at-least-once delivery; callers discard it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stale response for {page} with token {token}")]
pub struct StaleToken {
    pub page: VectorPageId,
    pub token: RequestToken,
}

/// Terminal outcome delivered to a waiter that did not get a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("page load failed: {0}")]
    LoadFailed(FailureReason),
    #[error("load coordinator shut down")]
    Shutdown,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("message kind {kind} already registered as {existing}")]
    DuplicateKind { kind: u8, existing: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid coordinator config: {0}")]
    Invalid(&'static str),
    #[error("failed to parse coordinator config: {0}")]
    Parse(#[from] serde_json::Error),
}
