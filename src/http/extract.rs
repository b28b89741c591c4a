use serde_json::Value;
use std::collections::HashMap;

use crate::flows::FlowInput;

/// Request-scoped values injected by an upstream stage.
///
/// An upstream middleware that already knows the user (say, right after
/// registration) attaches this so the flow does not re-parse the
/// request: `id` wins over any identity in params or body, and
/// `body_override` picks the 201 response body on issuance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowContext {
    pub id: Option<String>,
    pub body_override: Option<String>,
}

/// Outcome attached to the request by the forwarding strategy, for both
/// success and error, so a downstream stage owns the response.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub status: axum::http::StatusCode,
    pub message: Option<String>,
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn layered(
    field: &str,
    params: &HashMap<String, String>,
    body: Option<&Value>,
) -> Option<String> {
    params.get(field).cloned().or_else(|| {
        body.and_then(|b| b.get(field)).and_then(value_as_string)
    })
}

/// Assemble flow inputs with layered priority: upstream context, then
/// path params, then JSON body fields.
pub fn build_input(
    context: Option<&FlowContext>,
    params: &HashMap<String, String>,
    body: Option<&Value>,
) -> FlowInput {
    FlowInput {
        user: context
            .and_then(|c| c.id.clone())
            .or_else(|| layered("user", params, body)),
        code: layered("code", params, body),
        password: layered("password", params, body),
        body_override: context.and_then(|c| c.body_override.clone()),
        request: body.cloned(),
    }
}
