//! Keyed, idempotent installation of opaque style payloads.
//!
//! The engine never parses payload content; styling is a rendering concern
//! outside this core. The registry's one job is the key invariant: at most
//! one active payload per key, replace on reinstall, removal always safe.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use refit_dom::HostDocument;

use crate::error::EngineError;

/// Registry of engine-owned style entries in the host document.
#[derive(Clone)]
pub struct StyleRegistry {
    doc: Arc<dyn HostDocument>,
    keys: Arc<Mutex<BTreeSet<String>>>,
}

impl StyleRegistry {
    pub fn new(doc: Arc<dyn HostDocument>) -> Self {
        Self {
            doc,
            keys: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn lock_keys(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        match self.keys.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Install a payload under `key`, replacing any previous payload with the
    /// same key. Never duplicates.
    pub async fn install(&self, key: &str, payload: &str) -> Result<(), EngineError> {
        self.doc.install_style(key, payload).await?;
        self.lock_keys().insert(key.to_string());
        Ok(())
    }

    /// Remove the payload under `key`; a no-op when absent.
    pub async fn remove(&self, key: &str) -> Result<(), EngineError> {
        self.doc.remove_style(key).await?;
        self.lock_keys().remove(key);
        Ok(())
    }

    /// Whether the document currently carries a payload under `key`.
    pub async fn installed(&self, key: &str) -> Result<bool, EngineError> {
        Ok(self.doc.style_installed(key).await?)
    }

    /// Keys this registry has installed and not yet removed.
    pub fn keys(&self) -> Vec<String> {
        self.lock_keys().iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use refit_dom::mock::MockDocument;

    #[tokio::test]
    async fn install_replaces_never_duplicates() {
        let doc = Arc::new(MockDocument::new());
        let registry = StyleRegistry::new(doc.clone());

        registry.install("rf-x", "a{}").await.unwrap();
        registry.install("rf-x", "b{}").await.unwrap();

        assert_eq!(doc.styles().len(), 1);
        assert_eq!(doc.style_payload("rf-x").as_deref(), Some("b{}"));
        assert_eq!(registry.keys(), vec!["rf-x".to_string()]);
    }

    #[tokio::test]
    async fn remove_is_safe_when_absent() {
        let doc = Arc::new(MockDocument::new());
        let registry = StyleRegistry::new(doc.clone());
        registry.remove("rf-never-installed").await.unwrap();
        assert!(!registry.installed("rf-never-installed").await.unwrap());
    }

    #[tokio::test]
    async fn clones_share_key_tracking() {
        let doc = Arc::new(MockDocument::new());
        let registry = StyleRegistry::new(doc.clone());
        let clone = registry.clone();
        clone.install("rf-y", "c{}").await.unwrap();
        assert_eq!(registry.keys(), vec!["rf-y".to_string()]);
    }
}
