//! CLI configuration: thin wrapper around `tc20e_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--service-url, --auth-header, --insecure, --timeout).

use tc20e_core::{AuthHeader, CoordinatorConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use tc20e_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the `CoordinatorConfig` for this invocation.
///
/// Uses the active profile when one exists; otherwise falls back to the
/// flags alone, which then must carry an auth header.
pub fn build_coordinator_config(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    if global.auth_header.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `CoordinatorConfig`.
///
/// Flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<CoordinatorConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.service_url {
        profile.service_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let config = match global.auth_header {
        Some(ref header) => {
            tc20e_config::coordinator_config(&profile, defaults, AuthHeader::from(header.clone()))?
        }
        None => tc20e_config::profile_to_coordinator_config(&profile, profile_name, defaults)?,
    };
    Ok(config)
}
