//! CLI error types with miette diagnostics.
//!
//! Maps `BridgeError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use flatbridge_config::ConfigError;
use flatbridge_core::BridgeError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Paths ────────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(
        code(flatbridge::invalid_path),
        help(
            "Paths look like panel.channels[2].gains[\"left\"].\n\
             Mapping keys are double-quoted and must not contain '\"'."
        )
    )]
    InvalidPath(BridgeError),

    #[error("{0}")]
    #[diagnostic(
        code(flatbridge::not_found),
        help("Run: flatbridge paths to see every addressable path")
    )]
    NotFound(BridgeError),

    // ── Values ───────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(
        code(flatbridge::rejected),
        help(
            "Enums take an ordinal or a member name; quantities take a bare number.\n\
             Run: flatbridge props to see each leaf's type."
        )
    )]
    Rejected(BridgeError),

    #[error("{0}")]
    #[diagnostic(
        code(flatbridge::not_callable),
        help("Only method members can be called. Run: flatbridge props to find them.")
    )]
    NotCallable(BridgeError),

    #[error("{0}")]
    #[diagnostic(code(flatbridge::call_failed))]
    CallFailed(BridgeError),

    #[error("{0}")]
    #[diagnostic(code(flatbridge::internal))]
    Internal(BridgeError),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(flatbridge::config),
        help(
            "Check the --config / --tree files and FLATBRIDGE_* variables.\n\
             Run: flatbridge config path"
        )
    )]
    Config(#[from] ConfigError),

    // ── Serialization ────────────────────────────────────────────────
    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(flatbridge::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(flatbridge::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<BridgeError> for CliError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::MalformedPath { .. } | BridgeError::UnsupportedKey { .. } => {
                Self::InvalidPath(err)
            }
            BridgeError::PathNotFound { .. } => Self::NotFound(err),
            BridgeError::OrdinalOutOfRange { .. }
            | BridgeError::TypeMismatch { .. }
            | BridgeError::UnknownEnum { .. } => Self::Rejected(err),
            BridgeError::NotCallable { .. } => Self::NotCallable(err),
            BridgeError::Invocation { .. } => Self::CallFailed(err),
            BridgeError::EnumRedefined { .. }
            | BridgeError::InvalidEnum { .. }
            | BridgeError::Internal(_) => Self::Internal(err),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPath(_) | Self::NotCallable(_) => exit_code::USAGE,
            Self::NotFound(_) => exit_code::NOT_FOUND,
            Self::Rejected(_) => exit_code::REJECTED,
            Self::Config(_) => exit_code::CONFIG,
            Self::CallFailed(_)
            | Self::Internal(_)
            | Self::Json(_)
            | Self::Yaml(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_map_to_exit_codes() {
        let not_found: CliError = BridgeError::PathNotFound {
            prefix: "nope".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let rejected: CliError = BridgeError::OrdinalOutOfRange {
            enum_name: "Mode".into(),
            ordinal: 7,
            len: 2,
        }
        .into();
        assert_eq!(rejected.exit_code(), exit_code::REJECTED);

        let malformed: CliError = BridgeError::MalformedPath {
            path: "a..b".into(),
            reason: "empty attribute".into(),
        }
        .into();
        assert_eq!(malformed.exit_code(), exit_code::USAGE);
    }
}
