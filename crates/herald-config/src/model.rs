// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Herald.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Voice-agent API settings (session create / monitor / transcript).
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Telephony API settings (PSTN call placement).
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Strategist LLM settings.
    #[serde(default)]
    pub strategist: StrategistConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Job scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Ingestion/status HTTP surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Completion notifier settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fallback persona the remote voice agent claims to represent when a
    /// job does not name a company.
    #[serde(default = "default_company_name")]
    pub default_company_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            default_company_name: default_company_name(),
        }
    }
}

fn default_agent_name() -> String {
    "herald".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_company_name() -> String {
    "Herald Front Office".to_string()
}

/// Voice-agent API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// Voice API key. `None` requires environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Remote agent id used for all outbound call sessions.
    #[serde(default)]
    pub agent_id: Option<String>,

    /// Base URL of the voice-agent API.
    #[serde(default = "default_voice_base_url")]
    pub base_url: String,

    /// Extra request attempts after the first failure.
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,

    /// Base delay between request retries; grows linearly per attempt.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Ceiling on call monitoring before the attempt is treated as
    /// timed out.
    #[serde(default = "default_monitor_timeout_secs")]
    pub monitor_timeout_secs: u64,

    /// Fixed interval between session-status polls.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            base_url: default_voice_base_url(),
            request_retries: default_request_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            monitor_timeout_secs: default_monitor_timeout_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
        }
    }
}

fn default_voice_base_url() -> String {
    "https://api.ultravox.ai/api".to_string()
}

fn default_request_retries() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    3
}

fn default_monitor_timeout_secs() -> u64 {
    300
}

fn default_monitor_interval_secs() -> u64 {
    15
}

/// Telephony API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelephonyConfig {
    /// Telephony account sid. `None` requires environment variable override.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Telephony auth token.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Caller id for all outbound calls.
    #[serde(default)]
    pub from_number: Option<String>,

    /// Base URL of the telephony REST API.
    #[serde(default = "default_telephony_base_url")]
    pub base_url: String,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            base_url: default_telephony_base_url(),
        }
    }
}

fn default_telephony_base_url() -> String {
    "https://api.twilio.com".to_string()
}

/// Strategist LLM configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StrategistConfig {
    /// API key for the strategist model. `None` requires env override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_strategist_model")]
    pub model: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_strategist_base_url")]
    pub base_url: String,

    /// Extra evaluation attempts after the first failure.
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,

    /// Base delay between evaluation retries; grows linearly per attempt.
    #[serde(default = "default_strategist_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for StrategistConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_strategist_model(),
            base_url: default_strategist_base_url(),
            request_retries: default_request_retries(),
            retry_delay_secs: default_strategist_retry_delay_secs(),
        }
    }
}

fn default_strategist_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_strategist_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_strategist_retry_delay_secs() -> u64 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("herald").join("herald.db"))
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "herald.db".to_string())
}

/// Job scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Hours a job may sit in PROCESSING before the stale sweep
    /// force-fails it.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,

    /// Attempt ceiling applied to jobs created without an explicit one.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            stale_after_hours: default_stale_after_hours(),
            default_max_retries: default_max_retries(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_stale_after_hours() -> u64 {
    24
}

fn default_max_retries() -> u32 {
    3
}

/// Ingestion/status HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for the /api routes. `None` disables auth.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8084
}

/// Completion notifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    /// Webhook that receives completion payloads. `None` disables the
    /// notifier loop.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Seconds between notifier poll cycles.
    #[serde(default = "default_notify_interval_secs")]
    pub poll_interval_secs: u64,

    /// How many times an outcome is surfaced before the job is marked
    /// informed.
    #[serde(default = "default_inform_repeat_count")]
    pub inform_repeat_count: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            poll_interval_secs: default_notify_interval_secs(),
            inform_repeat_count: default_inform_repeat_count(),
        }
    }
}

fn default_notify_interval_secs() -> u64 {
    30
}

fn default_inform_repeat_count() -> u32 {
    2
}
