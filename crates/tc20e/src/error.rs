//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use tc20e_config::ConfigError;
use tc20e_core::{CommandError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the panel service: {reason}")]
    #[diagnostic(
        code(tc20e::connection_failed),
        help(
            "Check network access to the service URL.\n\
             A slow service may need a longer --timeout."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tc20e::auth_failed),
        help(
            "The stored auth header was rejected.\n\
             Run: tc20e config set-credentials --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tc20e::no_credentials),
        help(
            "Configure credentials with: tc20e config init\n\
             Or set the TC20E_AUTH_HEADER environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Panel ────────────────────────────────────────────────────────

    #[error("Could not send '{command}' to the alarm panel: {reason}")]
    #[diagnostic(
        code(tc20e::command_failed),
        help("Run: tc20e status to see the state the panel is in now.")
    )]
    CommandFailed { command: String, reason: String },

    #[error("Could not retrieve alarm status: {reason}")]
    #[diagnostic(code(tc20e::status_unavailable))]
    StatusUnavailable { reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tc20e::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tc20e::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tc20e config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(tc20e::no_config),
        help(
            "Create one with: tc20e config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tc20e::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the profile name to an auth failure.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => Self::Config { message },

            CoreError::StatusUnavailable { source } => match source {
                CommandError::UpdateFailed(failure) => Self::StatusUnavailable {
                    reason: failure.to_string(),
                },
                other => Self::from(other),
            },

            CoreError::CommandFailed { command, source } => match source {
                CommandError::UpdateFailed(failure) => Self::CommandFailed {
                    command: command.to_string(),
                    reason: failure.to_string(),
                },
                other => Self::from(other),
            },

            CoreError::ValidationFailed { source } => Self::from(source),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Authentication { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            CommandError::CannotConnect { reason } => Self::ConnectionFailed { reason },
            CommandError::UpdateFailed(failure) => Self::StatusUnavailable {
                reason: failure.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
