// Panel service HTTP client
//
// Wraps `reqwest::Client` with service URL construction and session-token
// bookkeeping. The login/logout handshake and the command endpoints are
// implemented as inherent methods in `session.rs` and `commands.rs` to keep
// this module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use tracing::trace;
use url::Url;

use crate::auth::SessionToken;
use crate::error::Error;
use crate::models::PanelResponse;
use crate::transport::TransportConfig;

/// Public endpoint of the Total Connect 2.0E service.
pub const DEFAULT_SERVICE_URL: &str = "https://tc20e.total-connect.eu";

/// Raw HTTP client for the panel web service.
///
/// Holds at most one session token at a time. The service itself only
/// tolerates a single active session per account, so serializing sessions
/// is the caller's job (see `tc20e-core`'s executor gate).
pub struct PanelClient {
    http: reqwest::Client,
    base_url: Url,
    /// Session id captured at login and cleared at logout.
    session: RwLock<Option<SessionToken>>,
}

impl PanelClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically: the validate and home-page steps of the login share
    /// a server-side cookie session.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            session: RwLock::new(None),
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Session token management ─────────────────────────────────────

    /// The token of the current session, if logged in.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set_session_token(&self, token: SessionToken) {
        trace!("storing session token");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the local session token without contacting the service.
    pub fn clear_session_token(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current token or `NotLoggedIn`.
    pub(crate) fn require_session(&self) -> Result<SessionToken, Error> {
        self.session_token().ok_or(Error::NotLoggedIn)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a service path such as `/validate`.
    pub(crate) fn service_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Drain a response into a `PanelResponse`, keeping status and content
    /// type for the caller to branch on.
    pub(crate) async fn read_response(resp: reqwest::Response) -> Result<PanelResponse, Error> {
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await?;
        Ok(PanelResponse {
            status,
            content_type,
            body,
        })
    }
}
