//! The evaluate-once loader operation.
//!
//! The loader contract is deliberately thin: evaluate source text in the
//! host document's context exactly once, and surface "threw or did not
//! throw" — with the thrown message — to the caller.

use serde_json::{json, Value};

use crate::channel::DebugChannel;
use crate::error::CdpError;

/// Evaluate `source` in the host document. Returns the stringified result
/// value on success; a throw inside the document surfaces as
/// [`CdpError::EvaluationThrew`] carrying the thrown message.
pub async fn evaluate_once(channel: &DebugChannel, source: &str) -> Result<String, CdpError> {
    channel.call("Runtime.enable", json!({})).await?;

    let result = channel
        .call(
            "Runtime.evaluate",
            json!({
                "expression": source,
                "awaitPromise": true,
                "returnByValue": true,
            }),
        )
        .await?;

    if let Some(details) = result.get("exceptionDetails") {
        return Err(CdpError::EvaluationThrew {
            message: thrown_message(details),
        });
    }

    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .map(render_value)
        .unwrap_or_default())
}

fn thrown_message(details: &Value) -> String {
    if let Some(description) = details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
    {
        return description.to_string();
    }
    details
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("evaluation threw")
        .to_string()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_message_prefers_the_exception_description() {
        let details = json!({
            "text": "Uncaught",
            "exception": {"description": "Error: anchor missing"}
        });
        assert_eq!(thrown_message(&details), "Error: anchor missing");
    }

    #[test]
    fn thrown_message_falls_back_to_text() {
        let details = json!({"text": "Uncaught (in promise)"});
        assert_eq!(thrown_message(&details), "Uncaught (in promise)");
    }

    #[test]
    fn values_render_without_json_quoting_for_strings() {
        assert_eq!(render_value(&json!("done")), "done");
        assert_eq!(render_value(&json!(3)), "3");
        assert_eq!(render_value(&json!(true)), "true");
    }
}
