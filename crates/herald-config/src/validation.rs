// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and
//! non-zero intervals.

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate gateway host is not empty and looks like an IP or hostname.
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    // Validate database_path is not empty.
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Zero intervals would spin the loops or stall monitoring forever.
    if config.scheduler.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.poll_interval_secs must be at least 1".to_string(),
        });
    }
    if config.voice.monitor_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "voice.monitor_interval_secs must be at least 1".to_string(),
        });
    }
    if config.voice.monitor_timeout_secs < config.voice.monitor_interval_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "voice.monitor_timeout_secs ({}) must not be less than voice.monitor_interval_secs ({})",
                config.voice.monitor_timeout_secs, config.voice.monitor_interval_secs
            ),
        });
    }

    if config.scheduler.default_max_retries == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.default_max_retries must be at least 1".to_string(),
        });
    }

    if config.notifier.inform_repeat_count == 0 {
        errors.push(ConfigError::Validation {
            message: "notifier.inform_repeat_count must be at least 1".to_string(),
        });
    }

    // The caller id must be usable as-is by the telephony API.
    if let Some(from) = &config.telephony.from_number {
        let digits = from.strip_prefix('+').unwrap_or(from);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "telephony.from_number `{from}` must be digits with an optional leading +"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
