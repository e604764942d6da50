// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction for the outcome strategist.
//!
//! The model sees the overall job context, the history of earlier
//! attempts, and the transcript of the attempt under analysis, and must
//! answer with a single JSON object matching [`ActionPlan`].
//!
//! [`ActionPlan`]: herald_core::ActionPlan

use herald_core::types::{Attempt, Job};

/// System prompt pinning the output contract.
pub const SYSTEM_PROMPT: &str = "You are an AI Call Strategist. Your output must be a \
single valid JSON object as specified, without any markdown formatting or extraneous text.";

/// Build the analysis prompt for one finished attempt.
///
/// `history` holds the *other* attempts of the job, sorted by attempt
/// number; the attempt under analysis is represented by `transcript`.
pub fn build_prompt(job: &Job, transcript: &str, history: &[Attempt]) -> String {
    format!(
        r#"You are an advanced AI Call Strategist. Your role is to analyze the outcome of an automated phone call and decide on the next best course of action for an OVERALL JOB.

**Initial Call Context (Overall Job):**
*   Job ID: {job_id}
*   Original Overall Objective for the Job: "{initial_objective}"
*   Contact Name: "{contact_name}"
*   Phone Number: "{phone_number}"
*   Number of Previous Attempts for this Job (excluding current): {retries_attempted}
*   Maximum Allowed Attempts for this Job: {max_retries}

**Details of the CURRENT Call Attempt Being Analyzed:**
*   Objective for this Current Attempt: "{current_objective}"
{history}
**Transcript of THIS LATEST Call Attempt:**
---BEGIN TRANSCRIPT---
{transcript}
---END TRANSCRIPT---

**Your Tasks:**

1.  **Summarize THIS LATEST call attempt:** Provide a concise summary (max 3-4 sentences) of what happened during THIS specific call from the perspective of the automated caller. This summary will be shown to the end-user.
2.  **Assess Objective Completion for THIS ATTEMPT:** Based on the "Objective for this Current Attempt" and THIS transcript, was that specific objective met?
3.  **Analyze User Requests/Cues & Call Quality:** Did the contact explicitly ask to be called back at a specific time? Did they provide any information that makes the original overall job objective currently unachievable or moot? Was the conversation inconclusive for THIS attempt due to poor line quality, repeated misunderstandings, or other issues?
4.  **Determine Next Action for the OVERALL JOB:** Based on your analysis of THIS attempt and any relevant history, decide the next logical step for the overall job. If the "Original Overall Objective for the Job" appears to be fulfilled by this current attempt, the job should be marked as completed successfully. Consider the number of attempts already made.

**Output Format (Return ONLY a single, valid JSON object with NO markdown formatting):**

{{
    "summary_for_user": "string",
    "objective_met_status": "MET" | "NOT_MET_RETRY_RECOMMENDED" | "NOT_MET_RETRY_NOT_RECOMMENDED" | "INCONCLUSIVE_CHECK_RETRY",
    "next_action": "MARK_COMPLETED_SUCCESS" | "SCHEDULE_RETRY" | "MARK_FAILED_OBJECTIVE_UNACHIEVED" | "MARK_FAILED_MAX_RETRIES",
    "reasoning": "string",
    "next_objective_if_retry": "string_or_null",
    "requested_retry_delay_minutes": "integer_or_null"
}}

Key rules:
- "next_objective_if_retry": required when "next_action" is "SCHEDULE_RETRY". It MUST incorporate context from this call AND aim to progress the "Original Overall Objective for the Job".
- "requested_retry_delay_minutes": only when the contact explicitly requested a callback after some delay. Null otherwise.
- If the "Original Overall Objective for the Job" is met by this current attempt, "next_action" MUST be "MARK_COMPLETED_SUCCESS".
- If previous attempts + 1 (for this current attempt) reaches the maximum allowed attempts AND the objective is still not met, "next_action" must be "MARK_FAILED_MAX_RETRIES".
"#,
        job_id = job.id,
        initial_objective = job.initial_objective,
        contact_name = job.contact_name,
        phone_number = job.phone_number,
        retries_attempted = job.retries_attempted,
        max_retries = job.max_retries,
        current_objective = job.current_objective,
        history = format_history(history),
        transcript = transcript,
    )
}

/// Render the per-attempt history block, or a fixed line when the job
/// has no earlier attempts.
fn format_history(history: &[Attempt]) -> String {
    if history.is_empty() {
        return "\nNo previous attempts for this overall job.\n".to_string();
    }

    let mut sorted: Vec<&Attempt> = history.iter().collect();
    sorted.sort_by_key(|a| a.attempt_number);

    let mut block = String::from("\n**History of Previous Attempts for this Overall Job:**\n");
    for attempt in sorted {
        block.push_str(&format!(
            "\n--- Attempt #{number} (Session: {session}) ---\n\
             Objective for that attempt: {objective}\n\
             Call End Reason: {end_reason}\n\
             Summary of that attempt: {summary}\n\
             Outcome of that attempt: {outcome}\n\
             Error details (if any): {errors}\n",
            number = attempt.attempt_number,
            session = attempt.session_id.as_deref().unwrap_or("N/A"),
            objective = attempt.objective,
            end_reason = attempt.end_reason.as_deref().unwrap_or("N/A"),
            summary = attempt.summary.as_deref().unwrap_or("N/A"),
            outcome = attempt
                .objective_met_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            errors = attempt.error_details.as_deref().unwrap_or("None"),
        ));
    }
    block
}
