// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./oficio.toml` > `~/.config/oficio/oficio.toml` >
//! `/etc/oficio/oficio.toml` with environment variable overrides via the
//! `OFICIO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OficioConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/oficio/oficio.toml` (system-wide)
/// 3. `~/.config/oficio/oficio.toml` (user XDG config)
/// 4. `./oficio.toml` (local directory)
/// 5. `OFICIO_*` environment variables
pub fn load_config() -> Result<OficioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OficioConfig::default()))
        .merge(Toml::file("/etc/oficio/oficio.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("oficio/oficio.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("oficio.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<OficioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OficioConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OficioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OficioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `OFICIO_API_BASE_URL` must map to
/// `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("OFICIO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: OFICIO_API_BASE_URL -> "api_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("api_", "api.", 1)
            .replacen("realtime_", "realtime.", 1)
            .replacen("chat_", "chat.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.app.name, "oficio");
        assert_eq!(config.api.base_url, "http://127.0.0.1:3333");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[realtime]
url = "wss://rt.oficio.app/ws"
reconnect_attempts = 3
"#,
        )
        .unwrap();
        assert_eq!(config.realtime.url, "wss://rt.oficio.app/ws");
        assert_eq!(config.realtime.reconnect_attempts, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.api.page_size, 50);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(load_config_from_str("[api\nbase_url = ").is_err());
    }
}
