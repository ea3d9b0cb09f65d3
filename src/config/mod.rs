//! Configuration Management
//!
//! This module handles loading and saving named connection profiles.
//!
//! # Configuration Locations
//! - Local: `.harper/config.json` (team-shareable, per-project)
//! - Global: `~/.config/harper/profiles.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit parameters (CLI flags, builder calls) (highest priority)
//! 2. Local config file (`.harper/config.json`)
//! 3. Global config file (`~/.config/harper/profiles.json`)
//!
//! # Credentials
//! Tokens are never written to disk. A profile names the environment variable
//! that holds its token (`token_env`), resolved when the profile is used.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HarperError, Result};
use crate::session::SessionBuilder;

/// Profile registry stored in a config file
///
/// ```json
/// {
///   "profiles": {
///     "local": { "url": "http://localhost:9925", "schema": "dev" },
///     "prod": { "url": "https://db.example.com", "schema": "app", "token_env": "HARPER_PROD_TOKEN" }
///   },
///   "default": "local"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRegistry {
    /// Profiles by name
    #[serde(default)]
    pub profiles: BTreeMap<String, StoredProfile>,

    /// Name of the default profile (must exist in profiles map)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One stored connection profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    /// Endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Default schema for mutations, reads and bulk loads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Username used when issuing tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Echo wire bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

/// A stored profile with its token resolved from the environment
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub url: Option<String>,
    pub schema: Option<String>,
    pub username: Option<String>,
    /// WARNING: Sensitive data, do not log or include in error messages
    pub auth_token: Option<String>,
    pub debug: bool,
}

impl std::fmt::Debug for ResolvedProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProfile")
            .field("url", &self.url)
            .field("schema", &self.schema)
            .field("username", &self.username)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .finish()
    }
}

impl StoredProfile {
    /// Resolve the token environment variable
    pub fn resolve(&self) -> Result<ResolvedProfile> {
        let auth_token = match &self.token_env {
            Some(env_var) => match std::env::var(env_var) {
                Ok(token) => Some(token),
                Err(_) => {
                    return Err(HarperError::config_error(format!(
                        "Environment variable {env_var} not found for token"
                    )));
                }
            },
            None => None,
        };

        Ok(ResolvedProfile {
            url: self.url.clone(),
            schema: self.schema.clone(),
            username: self.username.clone(),
            auth_token,
            debug: self.debug.unwrap_or(false),
        })
    }
}

impl ResolvedProfile {
    /// Apply the profile to a session builder
    pub fn apply(&self, mut builder: SessionBuilder) -> SessionBuilder {
        if let Some(url) = &self.url {
            builder = builder.endpoint(url.clone());
        }
        if let Some(schema) = &self.schema {
            builder = builder.schema(schema.clone());
        }
        if let Some(token) = &self.auth_token {
            builder = builder.auth_token(token.clone());
        }
        builder.debug(self.debug)
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.harper/config.json` (team-shareable)
    Local,
    /// Global config: `~/.config/harper/profiles.json` (per-user)
    Global,
}

/// Get path to local config file (`.harper/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        HarperError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".harper").join("config.json"))
}

/// Get path to global config file (`~/.config/harper/profiles.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| HarperError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("harper").join("profiles.json"))
}

/// Load a profile registry from a config file
///
/// A missing file is an empty registry.
pub fn load_registry(path: &Path) -> Result<ProfileRegistry> {
    if !path.exists() {
        return Ok(ProfileRegistry::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| HarperError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| HarperError::config_error(format!("Invalid config file format: {e}")))
}

/// Save a profile registry to a config file, creating parent directories
pub fn save_registry(path: &Path, registry: &ProfileRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            HarperError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(registry)
        .map_err(|e| HarperError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| HarperError::config_error(format!("Could not write config file: {e}")))
}

/// Merge two registries; `local` wins for profiles with the same name
///
/// The local default replaces the global one when set.
#[must_use]
pub fn merge_registries(global: ProfileRegistry, local: ProfileRegistry) -> ProfileRegistry {
    let mut merged = global;
    merged.profiles.extend(local.profiles);
    if local.default.is_some() {
        merged.default = local.default;
    }
    merged
}

/// Load the merged view of global and local config
pub fn load_with_precedence() -> Result<ProfileRegistry> {
    let global = load_registry(&global_config_path()?)?;
    let local = load_registry(&local_config_path()?)?;
    Ok(merge_registries(global, local))
}

/// Pick a profile from a registry by name, or its default
pub fn select_profile<'a>(
    registry: &'a ProfileRegistry,
    name: Option<&str>,
) -> Result<(&'a str, &'a StoredProfile)> {
    let profile_name = match name {
        Some(n) => n,
        None => registry.default.as_deref().ok_or_else(|| {
            let available: Vec<_> = registry.profiles.keys().collect();
            HarperError::config_error(format!(
                "No default profile set. Available profiles: {available:?}. \
                 Specify one with --profile or set a default in the config."
            ))
        })?,
    };

    registry.profiles.get_key_value(profile_name).map(|(k, v)| (k.as_str(), v)).ok_or_else(|| {
        let available: Vec<_> = registry.profiles.keys().collect();
        HarperError::config_error(format!(
            "Profile '{profile_name}' not found. Available profiles: {available:?}"
        ))
    })
}

/// Resolve a profile by name (or the default) from the merged config
pub fn resolve_profile(name: Option<&str>) -> Result<ResolvedProfile> {
    let registry = load_with_precedence()?;
    let (_, profile) = select_profile(&registry, name)?;
    profile.resolve()
}

/// Resolve the registry's default profile, if it has one
///
/// No default is `Ok(None)`. A default that is missing from the registry, or
/// whose token variable is unset, is an error.
pub fn resolve_default_in(registry: &ProfileRegistry) -> Result<Option<ResolvedProfile>> {
    if registry.default.is_none() {
        return Ok(None);
    }
    let (_, profile) = select_profile(registry, None)?;
    profile.resolve().map(Some)
}

/// Resolve the default profile from the merged config, if one is set
pub fn resolve_default_profile() -> Result<Option<ResolvedProfile>> {
    resolve_default_in(&load_with_precedence()?)
}

/// Save a profile to a config file
///
/// The first profile saved to a file becomes its default.
pub fn save_profile(name: &str, profile: StoredProfile, location: ConfigLocation) -> Result<()> {
    let config_path = match location {
        ConfigLocation::Local => local_config_path()?,
        ConfigLocation::Global => global_config_path()?,
    };
    save_profile_to(&config_path, name, profile)
}

/// Save a profile to an explicit config file path
pub fn save_profile_to(path: &Path, name: &str, profile: StoredProfile) -> Result<()> {
    if name.is_empty() {
        return Err(HarperError::invalid_input("Profile name must not be empty"));
    }

    let mut registry = load_registry(path)?;
    let is_first_profile = registry.profiles.is_empty();

    registry.profiles.insert(name.to_string(), profile);

    if is_first_profile {
        registry.default = Some(name.to_string());
    }

    save_registry(path, &registry)
}

/// List profile names from the merged config, with the default marked
pub fn list_profiles() -> Result<Vec<(String, StoredProfile, bool)>> {
    let registry = load_with_precedence()?;
    let default = registry.default.clone();

    Ok(registry
        .profiles
        .into_iter()
        .map(|(name, profile)| {
            let is_default = default.as_deref() == Some(name.as_str());
            (name, profile, is_default)
        })
        .collect())
}
