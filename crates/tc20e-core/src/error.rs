// ── Core error types ──
//
// Two layers. `CommandError` is the executor's three-kind taxonomy
// (credentials rejected / service unreachable / update failed). `CoreError`
// is what the coordinator hands its callers: an operational failure that
// names the operation and keeps the `CommandError` as its source, so the
// kind survives the re-wrap.

use std::time::Duration;

use thiserror::Error;

use crate::model::{AlarmCommand, AlarmState};

/// Coarse failure class, stable across the re-wrapping layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    CannotConnect,
    UpdateFailed,
}

/// Why a command reached the service but produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("expected a JSON response, got content type {content_type:?}")]
    ContentType { content_type: String, body: String },

    #[error("malformed response: {message}")]
    Decode { message: String, body: String },

    #[error("panel reported the operation took too long")]
    TooLong,

    #[error("command still running after {attempts} status polls")]
    PollExhausted { attempts: u32 },
}

/// Failure of one command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Cannot connect to panel service: {reason}")]
    CannotConnect { reason: String },

    #[error("Update failed: {0}")]
    UpdateFailed(#[from] UpdateFailure),
}

impl CommandError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Authentication { .. } => FailureKind::Authentication,
            Self::CannotConnect { .. } => FailureKind::CannotConnect,
            Self::UpdateFailed(_) => FailureKind::UpdateFailed,
        }
    }

    /// State the panel must be shown in after this failure, if any.
    ///
    /// Only an abort reported by the panel itself overrides the current
    /// state; network failures leave it untouched.
    pub fn forced_state(&self) -> Option<AlarmState> {
        match self {
            Self::UpdateFailed(UpdateFailure::TooLong) => Some(AlarmState::Pending),
            _ => None,
        }
    }

    /// Classify a failure of the login handshake.
    ///
    /// Anything other than rejected credentials means the service could
    /// not be used, including a home page without a session id.
    pub(crate) fn from_login(err: tc20e_api::Error) -> Self {
        match err {
            tc20e_api::Error::Authentication { message } => Self::Authentication { message },
            other => Self::CannotConnect {
                reason: other.to_string(),
            },
        }
    }

    /// Classify a failure of a command or poll request.
    pub(crate) fn from_request(err: tc20e_api::Error) -> Self {
        if err.is_timeout() {
            Self::CannotConnect {
                reason: err.to_string(),
            }
        } else {
            Self::UpdateFailed(UpdateFailure::Transport(err.to_string()))
        }
    }

    pub(crate) fn timed_out(step: &str, timeout: Duration) -> Self {
        Self::CannotConnect {
            reason: format!("{step} timed out after {}s", timeout.as_secs_f32()),
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Could not retrieve alarm status: {source}")]
    StatusUnavailable { source: CommandError },

    #[error("Could not send '{command}' to alarm panel: {source}")]
    CommandFailed {
        command: AlarmCommand,
        source: CommandError,
    },

    #[error("Credential check failed: {source}")]
    ValidationFailed { source: CommandError },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Failure class of the underlying command, if there was one.
    pub fn kind(&self) -> Option<FailureKind> {
        self.command_error().map(CommandError::kind)
    }

    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::StatusUnavailable { source }
            | Self::CommandFailed { source, .. }
            | Self::ValidationFailed { source } => Some(source),
            Self::Config { .. } => None,
        }
    }
}
