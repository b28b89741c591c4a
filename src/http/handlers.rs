use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
    Extension, Json,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

use crate::activator::Activator;
use crate::error::ActivatorError;
use crate::flows::{FlowKind, Stage};
use crate::http::extract::{build_input, FlowContext, FlowOutcome};

const BODY_LIMIT: usize = 64 * 1024;

/// Handler state: which flow and stage a route runs, and through which
/// activator handle.
#[derive(Clone)]
pub struct FlowRoute {
    pub activator: Activator,
    pub kind: FlowKind,
    pub stage: Stage,
}

impl FlowRoute {
    pub fn new(activator: &Activator, kind: FlowKind, stage: Stage) -> Self {
        Self {
            activator: activator.clone(),
            kind,
            stage,
        }
    }
}

/// Direct-response strategy: run the flow and write status + body (or
/// the error's status + message) straight to the response.
#[instrument(skip_all, fields(kind = ?route.kind, stage = ?route.stage))]
pub async fn respond(
    State(route): State<FlowRoute>,
    params: Option<Path<HashMap<String, String>>>,
    context: Option<Extension<FlowContext>>,
    body: Option<Json<Value>>,
) -> Response {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    let input = build_input(
        context.as_ref().map(|Extension(c)| c),
        &params,
        body.as_ref().map(|Json(b)| b),
    );

    match route.activator.run(route.kind, route.stage, &input).await {
        Ok(outcome) => outcome.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Forwarding strategy: run the flow, attach a [`FlowOutcome`] to the
/// request (success and error alike) and hand control to the next
/// stage, which owns the response. Use with
/// `axum::middleware::from_fn_with_state` on a route layer so path
/// params are available.
#[instrument(skip_all, fields(kind = ?route.kind, stage = ?route.stage))]
pub async fn forward(
    State(route): State<FlowRoute>,
    params: Option<Path<HashMap<String, String>>>,
    req: Request,
    next: Next,
) -> Response {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    let context = req.extensions().get::<FlowContext>().cloned();

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ActivatorError::bad_request("Unreadable Body").into_response();
        }
    };
    let body_json: Option<Value> = serde_json::from_slice(&bytes).ok();
    let mut req = Request::from_parts(parts, Body::from(bytes));

    let input = build_input(context.as_ref(), &params, body_json.as_ref());
    let outcome = match route.activator.run(route.kind, route.stage, &input).await {
        Ok(outcome) => FlowOutcome {
            status: outcome.status,
            message: outcome.body,
        },
        Err(err) => FlowOutcome {
            status: err.status(),
            message: Some(err.to_string()),
        },
    };

    req.extensions_mut().insert(outcome);
    next.run(req).await
}

/// Downstream handler for forwarded routes that simply emits the
/// attached outcome. Useful as the innermost stage when no further
/// processing is needed.
pub async fn emit_outcome(outcome: Option<Extension<FlowOutcome>>) -> Response {
    match outcome {
        Some(Extension(outcome)) => {
            (outcome.status, outcome.message.unwrap_or_default()).into_response()
        }
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn route(activator: &Activator, kind: FlowKind, stage: Stage) -> MethodRouter {
    any(respond).with_state(FlowRoute::new(activator, kind, stage))
}

pub fn create_activate(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::Activate, Stage::Issue)
}

pub fn complete_activate(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::Activate, Stage::Complete)
}

pub fn create_password_reset(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::PasswordReset, Stage::Issue)
}

pub fn complete_password_reset(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::PasswordReset, Stage::Complete)
}

pub fn create_cafe_auth(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::CafeAuth, Stage::Issue)
}

pub fn complete_cafe_auth(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::CafeAuth, Stage::Complete)
}

pub fn create_cafe_reset(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::CafeReset, Stage::Issue)
}

pub fn complete_cafe_reset(activator: &Activator) -> MethodRouter {
    route(activator, FlowKind::CafeReset, Stage::Complete)
}
