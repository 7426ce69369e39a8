//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use tc20e_core::{AuthHeader, Coordinator, DEFAULT_SERVICE_URL};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the auth header.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "poll_interval_ms = {}", d.poll_interval_ms);
    let _ = writeln!(out, "max_poll_attempts = {}", d.max_poll_attempts);
    let _ = writeln!(out, "refresh_interval = {}", d.refresh_interval);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "service_url = \"{}\"", p.service_url);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.auth_header.is_some() {
            let _ = writeln!(out, "auth_header = \"****\"");
        }
        if let Some(ref env) = p.auth_header_env {
            let _ = writeln!(out, "auth_header_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(optimistic) = p.optimistic_state {
            let _ = writeln!(out, "optimistic_state = {optimistic}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Prompt for username and password and encode them into an auth header.
///
/// The password itself never leaves this function.
fn prompt_auth_header(default_user: Option<&str>) -> Result<(String, AuthHeader), CliError> {
    let mut input = Input::<String>::new().with_prompt("Username");
    if let Some(user) = default_user {
        input = input.default(user.to_owned());
    }
    let user = input.interact_text().map_err(prompt_err)?;
    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    if user.is_empty() || pass.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let header = AuthHeader::from_credentials(&user, &SecretString::from(pass));
    Ok((user, header))
}

/// One login/logout round trip with the candidate header.
async fn verify(profile: &Profile, cfg: &Config, header: &AuthHeader) -> Result<(), CliError> {
    let coordinator_config = tc20e_config::coordinator_config(profile, &cfg.defaults, header.clone())?;
    eprintln!("   Checking credentials against {} ...", coordinator_config.service_url);
    Coordinator::validate_credentials(&coordinator_config).await?;
    eprintln!("   ✓ Credentials accepted");
    Ok(())
}

/// Store the header in the keyring, or return it for plaintext config.
///
/// Returns `Some(header)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_header_storage(profile_name: &str, header: &AuthHeader) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the auth header?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        tc20e_config::store_auth_header(profile_name, header)?;
        eprintln!("   ✓ Auth header stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(header.expose().to_owned()))
    }
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("tc20e -- configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let service_url: String = Input::new()
                .with_prompt("Service URL")
                .default(DEFAULT_SERVICE_URL.into())
                .interact_text()
                .map_err(prompt_err)?;

            let (username, header) = prompt_auth_header(None)?;

            let mut profile = Profile {
                service_url,
                username: Some(username),
                ..Profile::default()
            };

            // Nothing is written unless the service accepts the credentials.
            verify(&profile, &cfg, &header)
                .await
                .map_err(|e| e.for_profile(&profile_name))?;

            profile.auth_header = prompt_header_storage(&profile_name, &header)?;

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Try it: tc20e status");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &redacted(&cfg),
                format_config_redacted,
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "service_url" | "service-url" => {
                    tc20e_config::parse_service_url(&value)?;
                    profile.service_url = value;
                }
                "username" => profile.username = Some(value),
                "auth_header_env" | "auth-header-env" => profile.auth_header_env = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
                "optimistic_state" | "optimistic-state" => {
                    profile.optimistic_state = Some(parse_bool("optimistic_state", &value)?);
                }
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: service_url, username, \
                             auth_header_env, ca_cert, insecure, optimistic_state, timeout"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: tc20e config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetCredentials ──────────────────────────────────────────
        ConfigCommand::SetCredentials { profile } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let Some(existing) = cfg.profiles.get(&profile_name).cloned() else {
                return Err(profile_not_found(profile_name, &cfg));
            };

            let (username, header) = prompt_auth_header(existing.username.as_deref())?;
            verify(&existing, &cfg, &header)
                .await
                .map_err(|e| e.for_profile(&profile_name))?;

            tc20e_config::store_auth_header(&profile_name, &header)?;
            if let Some(p) = cfg.profiles.get_mut(&profile_name) {
                p.username = Some(username);
                p.auth_header = None;
            }
            config::save_config(&cfg)?;

            eprintln!("✓ Auth header stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        // ── Validate ────────────────────────────────────────────────
        ConfigCommand::Validate => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let coordinator_config = config::build_coordinator_config(global)?;

            Coordinator::validate_credentials(&coordinator_config)
                .await
                .map_err(|e| CliError::from(e).for_profile(&profile_name))?;

            if !global.quiet {
                eprintln!("✓ Credentials for profile '{profile_name}' accepted");
            }
            Ok(())
        }
    }
}

/// Serializable copy of the config with the auth headers masked.
fn redacted(cfg: &Config) -> Config {
    let mut copy = cfg.clone();
    for profile in copy.profiles.values_mut() {
        if profile.auth_header.is_some() {
            profile.auth_header = Some("****".into());
        }
    }
    copy
}
