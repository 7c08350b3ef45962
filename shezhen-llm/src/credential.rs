//! API credential sources.
//!
//! The client asks its source for a key at the start of every call and never
//! caches the answer, so a rotated key is picked up by the next analysis.

use std::sync::Arc;

use parking_lot::RwLock;

/// Something that can hand out the current API key.
pub trait CredentialSource: Send + Sync {
    /// The key to use for the call about to start, if any.
    fn api_key(&self) -> Option<String>;
}

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads an environment variable on every call.
#[derive(Clone)]
pub struct EnvCredential {
    var: String,
    lookup: Lookup,
}

impl EnvCredential {
    /// Read the key from the process environment variable `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self::with_lookup(var, |name| std::env::var(name).ok())
    }

    /// Resolve `var` through `lookup` instead of the process environment.
    #[must_use]
    pub fn with_lookup(
        var: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            var: var.into(),
            lookup: Arc::new(lookup),
        }
    }

    /// Name of the variable consulted.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl std::fmt::Debug for EnvCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvCredential").field("var", &self.var).finish()
    }
}

impl CredentialSource for EnvCredential {
    fn api_key(&self) -> Option<String> {
        (self.lookup)(&self.var).filter(|k| !k.trim().is_empty())
    }
}

/// A fixed key.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredential(<redacted>)")
    }
}

impl CredentialSource for StaticCredential {
    fn api_key(&self) -> Option<String> {
        (!self.0.trim().is_empty()).then(|| self.0.clone())
    }
}

/// A key that can be replaced at runtime. Clones share the same slot.
#[derive(Clone, Default)]
pub struct RotatingCredential {
    inner: Arc<RwLock<Option<String>>>,
}

impl RotatingCredential {
    #[must_use]
    pub fn new(key: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(key)),
        }
    }

    /// Replace the key; `None` revokes it.
    pub fn rotate(&self, key: Option<String>) {
        *self.inner.write() = key;
    }
}

impl std::fmt::Debug for RotatingCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingCredential")
            .field("present", &self.inner.read().is_some())
            .finish()
    }
}

impl CredentialSource for RotatingCredential {
    fn api_key(&self) -> Option<String> {
        self.inner.read().clone().filter(|k| !k.trim().is_empty())
    }
}
