use std::fmt::Write as _;

use iwait_core::{WaitError, WaitOutcome, WaitResult};
use serde_json::{Value, json};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// Timeouts, aborts and unsatisfied results exit 1; option and parse errors exit 2.
pub fn exit_code(outcome: &WaitOutcome) -> u8 {
    match outcome {
        Ok(result) if result.success => EXIT_SUCCESS,
        Ok(_) => EXIT_FAILURE,
        Err(WaitError::Timeout { .. } | WaitError::Aborted { .. }) => EXIT_FAILURE,
        Err(WaitError::Parse(_) | WaitError::Config { .. }) => EXIT_USAGE,
    }
}

pub fn to_json(outcome: &WaitOutcome) -> Value {
    match outcome {
        Ok(result) => result_json(result),
        Err(WaitError::Timeout { result, .. }) => {
            let mut value = result_json(result);
            value["error"] = json!({ "kind": "timeout", "message": outcome_message(outcome) });
            value
        }
        Err(WaitError::Aborted { elapsed }) => json!({
            "success": false,
            "elapsedMs": elapsed.as_millis() as u64,
            "error": { "kind": "aborted", "message": outcome_message(outcome) },
        }),
        Err(WaitError::Parse(_)) => json!({
            "success": false,
            "error": { "kind": "parse", "message": outcome_message(outcome) },
        }),
        Err(WaitError::Config { .. }) => json!({
            "success": false,
            "error": { "kind": "config", "message": outcome_message(outcome) },
        }),
    }
}

fn result_json(result: &WaitResult) -> Value {
    let errors: serde_json::Map<String, Value> = result
        .errors
        .iter()
        .map(|(resource, err)| (resource.clone(), Value::String(err.to_string())))
        .collect();
    json!({
        "success": result.success,
        "ready": result.ready,
        "notReady": result.not_ready,
        "errors": errors,
        "elapsedMs": result.elapsed.as_millis() as u64,
    })
}

fn outcome_message(outcome: &WaitOutcome) -> String {
    match outcome {
        Ok(_) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Human-readable summary, one line per fact.
pub fn summary(outcome: &WaitOutcome) -> String {
    let mut out = String::new();
    match outcome {
        Ok(result) => {
            let verdict = if result.success { "ready" } else { "not ready" };
            let _ = writeln!(
                out,
                "{verdict} after {}ms ({} of {} resources)",
                result.elapsed.as_millis(),
                result.ready.len(),
                result.ready.len() + result.not_ready.len()
            );
            push_errors(&mut out, result);
        }
        Err(err @ WaitError::Timeout { result, .. }) => {
            let _ = writeln!(out, "{err}");
            push_errors(&mut out, result);
        }
        Err(err) => {
            let _ = writeln!(out, "{err}");
        }
    }
    out
}

fn push_errors(out: &mut String, result: &WaitResult) {
    for (resource, err) in &result.errors {
        let _ = writeln!(out, "  {resource}: {err}");
    }
}
