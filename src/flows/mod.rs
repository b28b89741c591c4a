//! The code-issuance / code-validation state machine shared by all four
//! flow variants. Per user and flow kind a record moves
//! NONE -> PENDING (issue) -> COMPLETED (validate); a mismatched or
//! expired code leaves PENDING untouched, and a re-issue replaces the
//! outstanding token.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::config::ActivatorConfig;
use crate::error::ActivatorError;
use crate::mailer::TemplateKind;
use crate::store::UserQuery;

mod issue;
mod validate;

pub(crate) use issue::issue;
pub(crate) use validate::validate;

/// The flow variants. All four share the same machine shape and differ
/// only in their descriptor: which record fields they own, how the user
/// is looked up, whether codes expire, and how a mismatch is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Activate,
    PasswordReset,
    CafeAuth,
    CafeReset,
}

/// Issue a new code, or validate a presented one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Issue,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// By the configured identity field only.
    Identity,
    /// By identity or email, whichever matches.
    Login,
    /// By the configured email field only.
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mismatch {
    /// Activation-class: a wrong code is a 403.
    Forbidden,
    /// Reset-class: a wrong code is a 400 with a specific message.
    InvalidResetCode,
}

pub(crate) struct FlowProfile {
    pub code_field: &'static str,
    pub expiry_field: Option<&'static str>,
    pub lookup: Lookup,
    pub mismatch: Mismatch,
    pub sets_password: bool,
    pub template: TemplateKind,
}

impl FlowKind {
    pub(crate) fn profile(self) -> FlowProfile {
        match self {
            Self::Activate => FlowProfile {
                code_field: "activation_code",
                expiry_field: None,
                lookup: Lookup::Identity,
                mismatch: Mismatch::Forbidden,
                sets_password: false,
                template: TemplateKind::Activate,
            },
            Self::PasswordReset => FlowProfile {
                code_field: "password_reset_code",
                expiry_field: Some("password_reset_time"),
                lookup: Lookup::Login,
                mismatch: Mismatch::InvalidResetCode,
                sets_password: true,
                template: TemplateKind::PasswordReset,
            },
            Self::CafeAuth => FlowProfile {
                code_field: "cafe_auth_code",
                expiry_field: None,
                lookup: Lookup::Email,
                mismatch: Mismatch::Forbidden,
                sets_password: false,
                template: TemplateKind::CafeAuth,
            },
            Self::CafeReset => FlowProfile {
                code_field: "cafe_reset_code",
                expiry_field: Some("cafe_reset_time"),
                lookup: Lookup::Email,
                mismatch: Mismatch::InvalidResetCode,
                sets_password: true,
                template: TemplateKind::CafeReset,
            },
        }
    }

    pub fn subject(self, config: &ActivatorConfig) -> &str {
        match self {
            Self::Activate => &config.subject_activate,
            Self::PasswordReset => &config.subject_password_reset,
            Self::CafeAuth => &config.subject_cafe_auth,
            Self::CafeReset => &config.subject_cafe_reset,
        }
    }

    fn missing_code_message(self) -> &'static str {
        match self.profile().mismatch {
            Mismatch::Forbidden => "Missing Activation Code",
            Mismatch::InvalidResetCode => "Missing Reset Code",
        }
    }
}

/// Inputs assembled by the HTTP layer (or by an embedding caller).
///
/// `user` carries the layered identity: an upstream-injected value wins
/// over path params, which win over body fields. `body_override` lets an
/// upstream stage pick the 201 response body on issuance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowInput {
    pub user: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
    pub body_override: Option<String>,
    pub request: Option<Value>,
}

impl FlowInput {
    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub(crate) fn require(
    value: &Option<String>,
    message: &'static str,
) -> Result<String, ActivatorError> {
    present(value)
        .map(str::to_owned)
        .ok_or_else(|| ActivatorError::bad_request(message))
}

/// Success result of a flow operation: a status plus an optional body.
/// Exactly one of `Outcome` or [`ActivatorError`] comes out of every
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    pub body: Option<String>,
}

impl Outcome {
    pub(crate) fn created(body: Option<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }

    pub(crate) fn completed() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (self.status, self.body.unwrap_or_default()).into_response()
    }
}

pub(crate) fn lookup_query(lookup: Lookup, config: &ActivatorConfig, identity: &str) -> UserQuery {
    match lookup {
        Lookup::Identity => UserQuery::by(config.id_property.as_str(), identity),
        Lookup::Email => UserQuery::by(config.email_property.as_str(), identity),
        Lookup::Login => UserQuery::by(config.id_property.as_str(), identity)
            .or(config.email_property.as_str(), identity),
    }
}

pub(crate) fn now_millis() -> i64 {
    let now = time::OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}
