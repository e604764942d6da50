// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading and validation end to end.

use herald_config::{load_and_validate_str, ConfigError};

#[test]
fn full_config_round_trip() {
    let config = load_and_validate_str(
        r#"
[agent]
name = "herald-test"
log_level = "debug"
default_company_name = "Acme Front Desk"

[voice]
api_key = "uv-test-key"
agent_id = "uv-agent-1"
monitor_timeout_secs = 120
monitor_interval_secs = 5

[telephony]
account_sid = "AC000"
auth_token = "secret"
from_number = "+15550001111"

[strategist]
api_key = "sk-test"
model = "gpt-4o"

[storage]
database_path = "/tmp/herald-test.db"

[scheduler]
poll_interval_secs = 2
stale_after_hours = 1
default_max_retries = 2

[gateway]
host = "0.0.0.0"
port = 9090
bearer_token = "hunter2"

[notifier]
webhook_url = "http://127.0.0.1:9091/notify"
poll_interval_secs = 5
inform_repeat_count = 3
"#,
    )
    .expect("full config should load");

    assert_eq!(config.agent.default_company_name, "Acme Front Desk");
    assert_eq!(config.voice.monitor_timeout_secs, 120);
    assert_eq!(config.scheduler.default_max_retries, 2);
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.notifier.inform_repeat_count, 3);
}

#[test]
fn unknown_key_produces_suggestion() {
    let errors = load_and_validate_str(
        r#"
[scheduler]
pol_interval_secs = 5
"#,
    )
    .unwrap_err();

    let has_suggestion = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { suggestion, .. }
                if suggestion.as_deref() == Some("poll_interval_secs")
        )
    });
    assert!(has_suggestion, "expected a typo suggestion, got {errors:?}");
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str(
        r#"
[notifier]
inform_repeat_count = 0
"#,
    )
    .unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("inform_repeat_count"))));
}

#[test]
fn defaults_alone_are_a_valid_config() {
    let config = load_and_validate_str("").expect("defaults must validate");
    assert_eq!(config.scheduler.poll_interval_secs, 10);
    assert!(config.voice.api_key.is_none());
}
