//! Account activation and password reset flows as pluggable axum
//! handlers.
//!
//! The crate owns the one-time-code state machine: issuing a code binds
//! a fresh token (with an optional expiry) to a user record and emails a
//! link; validating a presented code applies the terminal mutation
//! (activate the account, or set the new password) and consumes the
//! token. Persistence and mail delivery stay behind the [`UserStore`]
//! and [`Notifier`]/[`MailTransport`] capability traits, so any schema
//! and any transport plug in.
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use accountflow::{
//!     Activator, ActivatorConfig, LogTransport, MemoryStore, TemplateNotifier,
//! };
//!
//! let config = ActivatorConfig::from_env();
//! let store = Arc::new(MemoryStore::new());
//! let notifier = Arc::new(TemplateNotifier::new(&config, Arc::new(LogTransport)));
//! let activator = Activator::new(config, store, notifier);
//!
//! let app: Router = Router::new()
//!     .route("/users/:user/activate", accountflow::http::complete_activate(&activator))
//!     .route("/passwordreset", accountflow::http::create_password_reset(&activator))
//!     .route("/passwordreset/:user", accountflow::http::complete_password_reset(&activator));
//! ```

mod activator;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod link;
pub mod mailer;
pub mod store;

pub use activator::Activator;
pub use config::ActivatorConfig;
pub use error::ActivatorError;
pub use flows::{FlowInput, FlowKind, Outcome, Stage};
pub use mailer::{
    Composer, LogTransport, MailTransport, Notifier, NotifyData, OutgoingMail, TemplateKind,
    TemplateNotifier,
};
pub use store::{MemoryStore, UserPatch, UserQuery, UserRecord, UserStore};
