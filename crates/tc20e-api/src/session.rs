// Panel service authentication
//
// Three-step login: a connect probe on `/`, HTTP Basic validation on
// `/validate` (which must answer with the literal `#1home`), then the home
// page whose inline script carries the session id. The session cookie set
// along the way lives in the client's jar; the scraped id is sent as
// `x-session-token` on every command request.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error};

use crate::auth::{AuthHeader, SessionToken};
use crate::client::PanelClient;
use crate::error::Error;

/// Body the validate endpoint returns for accepted credentials.
pub const VALIDATE_SUCCESS: &str = "#1home";

static SESSION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"homeSessionId='(.*?)'").expect("session id pattern is a valid regex")
});

/// Pull the session id out of the home page HTML.
pub fn extract_session_id(html: &str) -> Option<&str> {
    SESSION_ID
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
}

impl PanelClient {
    /// Authenticate and open a session.
    ///
    /// On success the session token is stored on the client and returned.
    /// Fails with `Error::Authentication` when the validate endpoint does
    /// not return the success marker, and with `Error::SessionToken` when
    /// the home page does not carry a session id.
    pub async fn login(&self, auth: &AuthHeader) -> Result<SessionToken, Error> {
        debug!("trying to login at {}", self.base_url());

        self.http()
            .get(self.service_url("/")?)
            .send()
            .await?;

        let resp = self
            .http()
            .get(self.service_url("/validate")?)
            .header(reqwest::header::AUTHORIZATION, auth.expose())
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if body.trim() != VALIDATE_SUCCESS {
            error!(%status, response = %body.trim(), "auth failure");
            self.clear_session_token();
            return Err(Error::Authentication {
                message: format!("validate returned HTTP {status}: {:?}", body.trim()),
            });
        }

        let resp = self
            .http()
            .get(self.service_url("/go/home")?)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let html = resp.text().await?;

        let Some(id) = extract_session_id(&html) else {
            error!(status, "failed to retrieve session id");
            self.clear_session_token();
            return Err(Error::SessionToken { status });
        };

        let token = SessionToken::new(id);
        self.set_session_token(token.clone());
        debug!("session id retrieved");
        Ok(token)
    }

    /// End the current session.
    ///
    /// The local token is cleared whether or not the request succeeds, so
    /// the client never reuses a session the server may already have dropped.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.service_url("/logout")?;
        debug!("logging out at {}", url);

        let result = self.http().get(url).send().await;
        self.clear_session_token();
        result?;

        debug!("logout complete");
        Ok(())
    }
}
