// ── Session client ──
//
// Timeout-bounded login/logout on top of `PanelClient`. Login failures are
// classified into the command taxonomy; logout never fails, so it can run
// on every exit path without masking the error being returned.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use tc20e_api::{AuthHeader, PanelClient};

use crate::error::CommandError;

pub struct SessionClient {
    client: Arc<PanelClient>,
    auth: AuthHeader,
    timeout: Duration,
}

impl SessionClient {
    pub fn new(client: Arc<PanelClient>, auth: AuthHeader, timeout: Duration) -> Self {
        Self {
            client,
            auth,
            timeout,
        }
    }

    pub fn client(&self) -> &PanelClient {
        &self.client
    }

    /// Open a session.
    ///
    /// Rejected credentials become `Authentication`; a timeout, transport
    /// failure or missing session id becomes `CannotConnect`.
    pub async fn login(&self) -> Result<(), CommandError> {
        match timeout(self.timeout, self.client.login(&self.auth)).await {
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "timeout during login");
                Err(CommandError::timed_out("login", self.timeout))
            }
            Ok(Err(e)) => Err(CommandError::from_login(e)),
            Ok(Ok(_)) => {
                debug!("login passed");
                Ok(())
            }
        }
    }

    /// Close the session, best effort.
    ///
    /// Errors and timeouts are logged and swallowed. The local token is
    /// always gone afterwards.
    pub async fn logout(&self) {
        match timeout(self.timeout, self.client.logout()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "logout failed"),
            Err(_) => warn!(timeout_secs = self.timeout.as_secs(), "timeout during logout"),
        }
        self.client.clear_session_token();
    }

    /// One login followed by one logout, whatever the login result.
    ///
    /// Used by onboarding to check credentials without running a command.
    pub async fn validate(&self) -> Result<(), CommandError> {
        let result = self.login().await;
        self.logout().await;
        result
    }
}
