// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript rendering: the voice API's structured message list becomes
//! one newline-joined text block with a fixed per-role line format, fed
//! verbatim to the strategist and stored on the attempt.

use crate::types::TranscriptMessage;

/// Returned when the message list is empty.
pub const EMPTY_TRANSCRIPT: &str = "No messages found in transcript results.";

/// Render a message list into the canonical transcript text.
pub fn format_transcript(messages: &[TranscriptMessage]) -> String {
    if messages.is_empty() {
        return EMPTY_TRANSCRIPT.to_string();
    }

    let lines: Vec<String> = messages.iter().map(format_line).collect();
    lines.join("\n")
}

fn format_line(message: &TranscriptMessage) -> String {
    let text = message.text.as_deref().map(str::trim).unwrap_or("");
    let tool = message.tool_name.as_deref().unwrap_or("unknown");
    match message.role.as_str() {
        "MESSAGE_ROLE_AGENT" => {
            let text = if text.is_empty() { "[No text]" } else { text };
            format!("Agent: {text}")
        }
        "MESSAGE_ROLE_USER" => {
            let text = if text.is_empty() { "[No STT/text]" } else { text };
            format!("User: {text}")
        }
        "MESSAGE_ROLE_TOOL_CALL" => format!("System: [Tool Call: {tool}, Args: {text}]"),
        "MESSAGE_ROLE_TOOL_RESULT" => format!("System: [Tool Result: {tool}, Out: {text}]"),
        role => {
            let text = if text.is_empty() { "[No text]" } else { text };
            format!("{role}: {text}")
        }
    }
}
