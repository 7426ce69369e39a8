// ── Runtime coordinator configuration ──
//
// These types describe *how* to talk to the panel service. They carry the
// pre-built auth header and timing knobs but never touch disk; the CLI
// builds a `CoordinatorConfig` from its profile and hands it in.

use std::time::Duration;

use tc20e_api::{AuthHeader, TlsMode, TransportConfig};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(180);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). The public service has a valid certificate.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one panel account.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Service root (e.g., `https://tc20e.total-connect.eu`).
    pub service_url: Url,
    /// Pre-built `Authorization` header from onboarding.
    pub auth: AuthHeader,
    pub tls: TlsVerification,
    /// Bound on every single network step (login, submit, poll, logout).
    pub request_timeout: Duration,
    /// Pause between completion polls.
    pub poll_interval: Duration,
    /// Polls allowed before a running command is given up on.
    pub max_poll_attempts: u32,
    /// Period of [`Coordinator::spawn_refresh`](crate::Coordinator::spawn_refresh).
    pub refresh_interval: Duration,
    /// Show the command's target state before the panel confirms it, and
    /// keep it if the command fails.
    pub optimistic_state: bool,
}

impl CoordinatorConfig {
    /// Config for the service at `service_url` with default timing.
    pub fn new(service_url: Url, auth: AuthHeader) -> Self {
        Self {
            service_url,
            auth,
            tls: TlsVerification::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            optimistic_state: false,
        }
    }

    /// Transport settings for the underlying HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.request_timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}
