// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Oficio marketplace client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Oficio configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OficioConfig {
    /// Application identity and logging settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Marketplace backend HTTP settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Realtime channel settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Chat session behavior settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "oficio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Marketplace backend HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the marketplace backend.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request, if set.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,

    /// Message history page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            bearer_token: None,
            timeout_secs: default_api_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3333".to_string()
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    50
}

/// Realtime channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// WebSocket URL of the realtime fan-out server.
    #[serde(default = "default_realtime_url")]
    pub url: String,

    /// Delay between reconnection attempts, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum reconnection attempts before giving up.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_realtime_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_attempts: default_reconnect_attempts(),
        }
    }
}

fn default_realtime_url() -> String {
    "ws://127.0.0.1:3333/ws".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_reconnect_attempts() -> u32 {
    5
}

/// Whether outbound messaging is gated on budget status.
///
/// Two contradictory product policies have shipped; both are kept behind
/// this switch so the decision is config, not code.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SendPolicy {
    /// Messaging is always allowed regardless of budget status.
    #[default]
    Always,
    /// Messaging requires a budget with status Pending or Accepted.
    OpenBudgetOnly,
}

/// Chat session behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Delay before re-reading the budget after a push event, in
    /// milliseconds. Compensates for backend read-after-write lag.
    #[serde(default = "default_budget_reload_delay_ms")]
    pub budget_reload_delay_ms: u64,

    /// Send-permission policy.
    #[serde(default)]
    pub send_policy: SendPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            budget_reload_delay_ms: default_budget_reload_delay_ms(),
            send_policy: SendPolicy::default(),
        }
    }
}

fn default_budget_reload_delay_ms() -> u64 {
    500
}
