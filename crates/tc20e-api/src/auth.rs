use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

/// Pre-built `Authorization` header value for the validate endpoint.
///
/// The service expects HTTP Basic with two fixed trailing fields:
/// `Basic base64("{user}:{password}:1:0")`. Onboarding builds this once from
/// the user's credentials; afterwards only the opaque header is stored.
#[derive(Clone)]
pub struct AuthHeader(SecretString);

impl AuthHeader {
    /// Wrap an already-encoded header value (as read from config or keyring).
    pub fn new(value: SecretString) -> Self {
        Self(value)
    }

    /// Encode username and password into the header format the service expects.
    pub fn from_credentials(username: &str, password: &SecretString) -> Self {
        let raw = format!("{username}:{}:1:0", password.expose_secret());
        let encoded = STANDARD.encode(raw.as_bytes());
        Self(SecretString::from(format!("Basic {encoded}")))
    }

    /// The header value, for placing on the wire or storing in a keyring.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for AuthHeader {
    fn from(value: String) -> Self {
        Self(SecretString::from(value))
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthHeader([REDACTED])")
    }
}

/// Session id scraped from the post-login home page.
///
/// Sent as `x-session-token` on every command and poll request. Lives only
/// between one login and the following logout.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}
