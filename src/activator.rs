use std::sync::{Arc, RwLock};
use tracing::info;

use crate::config::ActivatorConfig;
use crate::error::ActivatorError;
use crate::flows::{self, FlowInput, FlowKind, Outcome, Stage};
use crate::mailer::Notifier;
use crate::store::UserStore;

/// Everything an operation needs: configuration plus the two
/// collaborator capabilities.
pub(crate) struct Engine {
    pub(crate) config: ActivatorConfig,
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

/// Handle through which every operation runs.
///
/// A handle starts uninitialized so routes can be wired before
/// configuration exists; any operation through an unarmed handle fails
/// with [`ActivatorError::Uninitialized`] before the store is touched.
/// `init` arms the handle (and every clone of it) exactly once per call.
#[derive(Clone)]
pub struct Activator {
    engine: Arc<RwLock<Option<Arc<Engine>>>>,
}

impl Activator {
    /// A handle with no configuration; every operation fails with
    /// `Uninitialized` until [`Activator::init`] is called.
    pub fn uninitialized() -> Self {
        Self {
            engine: Arc::new(RwLock::new(None)),
        }
    }

    /// A handle armed at construction.
    pub fn new(
        config: ActivatorConfig,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let activator = Self::uninitialized();
        activator.init(config, store, notifier);
        activator
    }

    /// Arm this handle (and all clones sharing it) with configuration
    /// and collaborators. A later call replaces the previous setup.
    pub fn init(
        &self,
        config: ActivatorConfig,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
    ) {
        let mut slot = self.engine.write().expect("activator lock poisoned");
        *slot = Some(Arc::new(Engine {
            config,
            store,
            notifier,
        }));
        info!("activator initialized");
    }

    fn engine(&self) -> Result<Arc<Engine>, ActivatorError> {
        self.engine
            .read()
            .expect("activator lock poisoned")
            .clone()
            .ok_or(ActivatorError::Uninitialized)
    }

    /// Issue a one-time code for the given flow.
    pub async fn issue(&self, kind: FlowKind, input: &FlowInput) -> Result<Outcome, ActivatorError> {
        let engine = self.engine()?;
        flows::issue(&engine, kind, input).await
    }

    /// Validate a presented code and complete the given flow.
    pub async fn validate(
        &self,
        kind: FlowKind,
        input: &FlowInput,
    ) -> Result<Outcome, ActivatorError> {
        let engine = self.engine()?;
        flows::validate(&engine, kind, input).await
    }

    pub async fn run(
        &self,
        kind: FlowKind,
        stage: Stage,
        input: &FlowInput,
    ) -> Result<Outcome, ActivatorError> {
        match stage {
            Stage::Issue => self.issue(kind, input).await,
            Stage::Complete => self.validate(kind, input).await,
        }
    }
}
