use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::ActivatorError;

/// A user record as the external store hands it out.
///
/// Records are schemaless on purpose: which field holds the identity or
/// the email is configuration, not code. Numeric ids are accepted and
/// read back as their string form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord(pub serde_json::Map<String, Value>);

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String view of a field; numbers are rendered, null and absence are `None`.
    pub fn get_str(&self, field: &str) -> Option<String> {
        match self.0.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }
}

/// Disjunctive field/value lookup: a record matches when *any* pair
/// matches. A single query can therefore express "by id or by email",
/// which is how reset flows accept either.
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pairs: Vec<(String, String)>,
}

impl UserQuery {
    pub fn by(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            pairs: vec![(field.into(), value.into())],
        }
    }

    pub fn or(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((field.into(), value.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn matches(&self, record: &UserRecord) -> bool {
        self.pairs
            .iter()
            .any(|(field, value)| record.get_str(field).as_deref() == Some(value.as_str()))
    }
}

/// Partial update: fields to set and fields to unset. Applying a patch
/// never touches fields it does not name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    set: serde_json::Map<String, Value>,
    unset: Vec<String>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    pub fn apply(&self, record: &mut UserRecord) {
        for (field, value) in &self.set {
            record.0.insert(field.clone(), value.clone());
        }
        for field in &self.unset {
            record.0.remove(field);
        }
    }
}

/// Persistence capability the flows depend on.
///
/// `find` and `save` are the whole contract; `throttle` is an optional
/// hook invoked between lookup and issuance. The default implementation
/// is a passthrough; a store that rate-limits returns its own error
/// (e.g. a 429-class [`ActivatorError::Common`]), which is surfaced to
/// the caller unchanged.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, query: &UserQuery) -> Result<Option<UserRecord>, ActivatorError>;

    /// Apply a partial patch to the record with the given id and return
    /// the updated record.
    async fn save(&self, id: &str, patch: UserPatch) -> Result<UserRecord, ActivatorError>;

    async fn throttle(&self, user: UserRecord) -> Result<UserRecord, ActivatorError> {
        Ok(user)
    }
}

/// In-memory store keyed by record id. Suitable for tests and embedded
/// setups; concurrency control is a plain `RwLock` (last write wins on
/// the token field, which is the accepted policy for re-issued codes).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, record: UserRecord) {
        self.users
            .write()
            .expect("memory store lock poisoned")
            .insert(id.into(), record);
    }

    /// Snapshot of a record, mainly for assertions.
    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.users
            .read()
            .expect("memory store lock poisoned")
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find(&self, query: &UserQuery) -> Result<Option<UserRecord>, ActivatorError> {
        let users = self.users.read().expect("memory store lock poisoned");
        Ok(users.values().find(|record| query.matches(record)).cloned())
    }

    async fn save(&self, id: &str, patch: UserPatch) -> Result<UserRecord, ActivatorError> {
        let mut users = self.users.write().expect("memory store lock poisoned");
        let record = users.get_mut(id).ok_or(ActivatorError::NotFound)?;
        patch.apply(record);
        Ok(record.clone())
    }
}
