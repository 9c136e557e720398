// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./tradechat.toml` > `~/.config/tradechat/tradechat.toml` >
//! `/etc/tradechat/tradechat.toml`, with `TRADECHAT_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::ChatConfig;

/// Config sections, used to map `TRADECHAT_<SECTION>_<KEY>` to `<section>.<key>`.
const SECTIONS: &[&str] = &["server", "session", "stomp", "auth", "logging"];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tradechat/tradechat.toml";

/// Per-directory config file.
pub const LOCAL_CONFIG_PATH: &str = "tradechat.toml";

/// Returns the user config path (`~/.config/tradechat/tradechat.toml` on Linux).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tradechat/tradechat.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tradechat/tradechat.toml`
/// 3. `~/.config/tradechat/tradechat.toml`
/// 4. `./tradechat.toml`
/// 5. `TRADECHAT_*` environment variables
pub fn load_config() -> Result<ChatConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. Used by tests.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
///
/// Unlike the hierarchy lookup, a missing file here is an error: the user
/// named it on the command line.
pub fn load_config_from_path(path: &Path) -> Result<ChatConfig, figment::Error> {
    debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Toml::file_exact(path))
        .merge(env_provider())
        .extract()
}

/// Build the hierarchy Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping the first `_` after a known section to a dot.
///
/// `TRADECHAT_SESSION_RECONNECT_DELAY_MS` becomes `session.reconnect_delay_ms`;
/// `Env::split("_")` would wrongly produce `session.reconnect.delay.ms`.
fn env_provider() -> Env {
    Env::prefixed("TRADECHAT_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key to a dotted config path.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            env_key_to_path("session_reconnect_delay_ms"),
            "session.reconnect_delay_ms"
        );
        assert_eq!(env_key_to_path("auth_token_file"), "auth.token_file");
        assert_eq!(env_key_to_path("server_history_url"), "server.history_url");
        assert_eq!(env_key_to_path("unknown_key"), "unknown_key");
    }

    #[test]
    fn env_override_wins_over_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_PATH,
                r#"
[server]
endpoint = "ws://from-file:1/ws"
"#,
            )?;
            jail.set_env("TRADECHAT_SERVER_ENDPOINT", "wss://from-env/ws");
            jail.set_env("TRADECHAT_SESSION_RECONNECT_DELAY_MS", "500");

            let config = load_config().expect("config should load");
            assert_eq!(config.server.endpoint, "wss://from-env/ws");
            assert_eq!(config.session.reconnect_delay_ms, 500);
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config_from_path(Path::new("/nonexistent/tradechat.toml"));
        assert!(result.is_err());
    }
}
