//! Hydration synchronizer
//!
//! Dependents of the credential store (pollers, the CLI's first request)
//! hold a [`HydrationSync`] and wait on it before touching the API.

use super::store::CredentialStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct HydrationSync {
    hydrated: watch::Receiver<bool>,
    synced: Arc<AtomicBool>,
}

impl HydrationSync {
    pub(crate) fn new(hydrated: watch::Receiver<bool>) -> Self {
        Self {
            hydrated,
            synced: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    /// Resolve once the store has finished loading. Also resolves if the
    /// store was dropped without ever loading.
    pub async fn wait_hydrated(&mut self) {
        if self.hydrated.wait_for(|done| *done).await.is_err() {
            tracing::debug!("Credential store dropped before hydration");
        }
    }

    /// Wait for hydration, then align the dispatcher with the store: push
    /// the stored token, or clear any stale one. Runs at most once per
    /// synchronizer (clones included); returns whether this call did it.
    pub async fn sync(&mut self, store: &CredentialStore) -> bool {
        self.wait_hydrated().await;

        if self.synced.swap(true, Ordering::SeqCst) {
            return false;
        }

        match store.credential() {
            Some(credential) => {
                tracing::debug!("Hydrated {} credential into dispatcher", credential.role);
                store.client().set_token(credential.token);
            }
            None => {
                tracing::debug!("No stored credential; clearing dispatcher token");
                store.client().clear_token();
            }
        }
        true
    }
}
