// ── Core error types ──
//
// Every failure here is local and synchronous: one resolve, coerce or
// apply call either succeeds or reports why. Nothing is retried, since
// walking an in-memory tree twice cannot change the outcome. The
// transport decides whether these reach the remote caller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    // ── Path grammar ─────────────────────────────────────────────────
    #[error("Malformed access path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Unsupported mapping key {key:?}: keys must not contain '\"'")]
    UnsupportedKey { key: String },

    // ── Resolution ───────────────────────────────────────────────────
    #[error("Path not found: nothing at '{prefix}'")]
    PathNotFound {
        /// Rendered prefix up to and including the first segment that
        /// could not be satisfied.
        prefix: String,
    },

    #[error("'{path}' is not callable")]
    NotCallable { path: String },

    // ── Coercion ─────────────────────────────────────────────────────
    #[error("Ordinal {ordinal} out of range for enum {enum_name} ({len} members)")]
    OrdinalOutOfRange {
        enum_name: String,
        ordinal: i64,
        len: usize,
    },

    #[error("Type mismatch: cannot coerce {found} into {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("Unknown enum type: {name}")]
    UnknownEnum { name: String },

    #[error("Enum {name} is already registered with different members")]
    EnumRedefined { name: String },

    #[error("Invalid enum {name}: {reason}")]
    InvalidEnum { name: String, reason: String },

    // ── Invocation ───────────────────────────────────────────────────
    #[error("Call to '{path}' failed: {message}")]
    Invocation { path: String, message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}
