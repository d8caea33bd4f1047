//! Tenant registration: the extension point other modules build on.

use std::fmt;

/// Failure reported by a tenant's own save or load hook.
///
/// Hooks run arbitrary module code; the orchestrator only needs something
/// printable to log and record, so the error is a plain message.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TenantError {
    message: String,
}

impl TenantError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Save/load capability registered under a tenant key.
///
/// `save` produces an opaque string payload; `load` must accept exactly the
/// string a prior `save` produced. That round-trip law is the whole contract
/// between a tenant and the orchestrator.
pub trait Tenant {
    fn save(&mut self) -> Result<String, TenantError>;
    fn load(&mut self, payload: &str) -> Result<(), TenantError>;
}

/// Adapter turning a plain closure pair into a [`Tenant`].
pub struct FnTenant<S, L> {
    save: S,
    load: L,
}

impl<S, L> Tenant for FnTenant<S, L>
where
    S: FnMut() -> Result<String, TenantError>,
    L: FnMut(&str) -> Result<(), TenantError>,
{
    fn save(&mut self) -> Result<String, TenantError> {
        (self.save)()
    }

    fn load(&mut self, payload: &str) -> Result<(), TenantError> {
        (self.load)(payload)
    }
}

/// Insertion-ordered map from tenant key to its capability.
///
/// Order matters on save: tenants save in the order they registered, so the
/// identity tenant (registered first by the session) leads the container.
/// Load dispatch follows container order instead and does not consult this
/// ordering.
#[derive(Default)]
pub struct TenantRegistry {
    entries: Vec<(String, Box<dyn Tenant>)>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the tenant under `key`.
    ///
    /// Replacing keeps the original registration position. Tenants register
    /// once at module init, so a replacement usually means two modules chose
    /// the same key; it is allowed but logged.
    pub fn register(&mut self, key: impl Into<String>, tenant: Box<dyn Tenant>) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            tracing::warn!(key = %key, "replacing already registered tenant");
            entry.1 = tenant;
        } else {
            self.entries.push((key, tenant));
        }
    }

    /// Register a save/load closure pair under `key`.
    pub fn register_fns<S, L>(&mut self, key: impl Into<String>, save: S, load: L)
    where
        S: FnMut() -> Result<String, TenantError> + 'static,
        L: FnMut(&str) -> Result<(), TenantError> + 'static,
    {
        self.register(key, Box::new(FnTenant { save, load }));
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut (dyn Tenant + 'static)> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, t)| t.as_mut())
    }

    /// Tenants in registration order.
    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut (dyn Tenant + 'static))> + '_ {
        self.entries
            .iter_mut()
            .map(|(k, t)| (k.as_str(), t.as_mut()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TenantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
