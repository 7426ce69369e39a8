//! Shared configuration for tc20e tools.
//!
//! TOML profiles, auth header resolution (env + keyring + plaintext),
//! and translation to `tc20e_core::CoordinatorConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tc20e_core::{AuthHeader, CoordinatorConfig, DEFAULT_SERVICE_URL, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/auth-header`.
pub const KEYRING_SERVICE: &str = "tc20e";

/// Env var consulted for the auth header when the profile names none.
pub const AUTH_HEADER_ENV: &str = "TC20E_AUTH_HEADER";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no auth header configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named panel accounts.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// `watch` refresh period in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    15
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_max_poll_attempts() -> u32 {
    120
}
fn default_refresh_interval() -> u64 {
    180
}

/// One panel account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Account name, kept for display only. The password is never stored.
    pub username: Option<String>,

    /// Encoded `Authorization` header (plaintext; prefer keyring or env var).
    pub auth_header: Option<String>,

    /// Environment variable name containing the auth header.
    pub auth_header_env: Option<String>,

    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Show the target state before the panel confirms a command.
    pub optimistic_state: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            username: None,
            auth_header: None,
            auth_header_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            optimistic_state: None,
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("eu", "tc20e", "tc20e").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tc20e");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// Env overrides use `__` as the nesting separator, e.g.
/// `TC20E_DEFAULTS__POLL_INTERVAL_MS=500`.
pub fn load_config() -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("TC20E_").split("__"));

    Ok(figment.extract()?)
}

/// Like [`load_config`], falling back to defaults when the file cannot be
/// read or parsed. The failure is logged so a broken file does not pass
/// silently as "no profiles".
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(
            path = %config_path().display(),
            error = %e,
            "ignoring unreadable config file"
        );
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Auth header storage ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/auth-header"),
    )?)
}

pub fn store_auth_header(profile_name: &str, header: &AuthHeader) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(header.expose())?;
    Ok(())
}

/// Remove a stored header. A missing entry is not an error.
pub fn delete_auth_header(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the auth header from the credential chain.
///
/// Order: the profile's `auth_header_env` variable, `TC20E_AUTH_HEADER`,
/// the system keyring, then plaintext in the config file.
pub fn resolve_auth_header(profile: &Profile, profile_name: &str) -> Result<AuthHeader, ConfigError> {
    let env_names = profile
        .auth_header_env
        .as_deref()
        .into_iter()
        .chain(std::iter::once(AUTH_HEADER_ENV));
    for name in env_names {
        if let Ok(val) = std::env::var(name) {
            return Ok(AuthHeader::new(SecretString::from(val)));
        }
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(AuthHeader::new(SecretString::from(secret)));
        }
    }

    if let Some(ref header) = profile.auth_header {
        return Ok(AuthHeader::from(header.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_service_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "service_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

pub fn tls_for(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `CoordinatorConfig` from a profile and the global defaults.
pub fn profile_to_coordinator_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<CoordinatorConfig, ConfigError> {
    let auth = resolve_auth_header(profile, profile_name)?;
    coordinator_config(profile, defaults, auth)
}

/// Like [`profile_to_coordinator_config`], with an auth header already in hand.
pub fn coordinator_config(
    profile: &Profile,
    defaults: &Defaults,
    auth: AuthHeader,
) -> Result<CoordinatorConfig, ConfigError> {
    let service_url = parse_service_url(&profile.service_url)?;
    if defaults.max_poll_attempts == 0 {
        return Err(ConfigError::Validation {
            field: "max_poll_attempts".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut config = CoordinatorConfig::new(service_url, auth);
    config.tls = tls_for(profile);
    config.request_timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval = Duration::from_millis(defaults.poll_interval_ms);
    config.max_poll_attempts = defaults.max_poll_attempts;
    config.refresh_interval = Duration::from_secs(defaults.refresh_interval);
    config.optimistic_state = profile.optimistic_state.unwrap_or(false);
    Ok(config)
}
