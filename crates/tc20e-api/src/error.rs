use thiserror::Error;

/// Top-level error type for the `tc20e-api` crate.
///
/// Covers every failure mode of the panel web service: the two-step login,
/// the transport, and session bookkeeping. `tc20e-core` folds these into
/// its three-kind command taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The validate endpoint did not answer with the success marker.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Login passed validation but the home page carried no session id.
    #[error("No session id in home page (HTTP {status})")]
    SessionToken { status: u16 },

    /// A session-scoped request was attempted without a prior login.
    #[error("No active session -- login required")]
    NotLoggedIn,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Returns `true` if this error indicates the credentials were rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the request never completed in time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the service could not be reached at all.
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            Self::Tls(_) => true,
            _ => self.is_timeout(),
        }
    }
}
