// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `./parley.toml` > `~/.config/parley/parley.toml` > `/etc/parley/parley.toml`,
//! with `PARLEY_*` environment variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ParleyConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/parley/parley.toml";
pub(crate) const LOCAL_CONFIG_FILE: &str = "parley.toml";

/// Path of the per-user config file, if a config dir exists on this platform.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parley").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml`
/// 3. `~/.config/parley/parley.toml`
/// 4. `./parley.toml`
/// 5. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading config from explicit path");
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `PARLEY_SECTION_KEY` to `section.key`.
///
/// Uses an explicit section list instead of `Env::split("_")` because key
/// names contain underscores: `PARLEY_POLL_LIST_INTERVAL_SECS` must map to
/// `poll.list_interval_secs`, and `PARLEY_CHANNELS_SMS_BASE_URL` to
/// `channels.sms.base_url`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const CHANNELS: [&str; 5] = ["sms", "widget", "messenger", "instagram", "email"];
    const SECTIONS: [&str; 5] = ["account", "logging", "poll", "presence", "backend"];

    if let Some(rest) = key.strip_prefix("channels_") {
        for channel in CHANNELS {
            if let Some(field) = rest.strip_prefix(channel).and_then(|r| r.strip_prefix('_')) {
                return format!("channels.{channel}.{field}");
            }
        }
        return key.to_string();
    }

    for section in SECTIONS {
        if let Some(field) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
