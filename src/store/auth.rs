//! Authentication gate for store calls.
//!
//! No request may reach the store before the session is established. The
//! session owner holds an [`AuthSignal`] and fires it once; every
//! [`AuthGate`] clone waits for that single event and then lets calls through
//! for the rest of its life.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use super::DocumentStore;
use crate::error::{Error, Result};

/// One-shot "session established" notifier.
#[derive(Debug)]
pub struct AuthSignal {
    tx: watch::Sender<bool>,
}

impl AuthSignal {
    /// Create a signal and the gate it opens.
    pub fn new() -> (AuthSignal, AuthGate) {
        let (tx, rx) = watch::channel(false);
        (AuthSignal { tx }, AuthGate { rx })
    }

    /// Mark the session as established. Consumes the signal.
    pub fn ready(self) {
        self.tx.send_replace(true);
        debug!("session established");
    }
}

/// Suspends store calls until the session is ready.
#[derive(Debug, Clone)]
pub struct AuthGate {
    rx: watch::Receiver<bool>,
}

impl AuthGate {
    /// A gate that is already open.
    pub fn ready() -> Self {
        let (signal, gate) = AuthSignal::new();
        signal.ready();
        gate
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the session. Fails with [`Error::AuthClosed`] when the signal
    /// was dropped without firing.
    pub async fn wait(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        debug!("waiting for session before store call");
        let mut rx = self.rx.clone();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| Error::AuthClosed)
    }

    /// Run `op` once the session is ready, returning its result unchanged.
    pub async fn with_auth<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.wait().await?;
        op().await
    }
}

/// A store whose every call goes through an [`AuthGate`].
pub struct GatedStore<S> {
    inner: S,
    gate: AuthGate,
}

impl<S: DocumentStore> GatedStore<S> {
    pub fn new(inner: S, gate: AuthGate) -> Self {
        Self { inner, gate }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for GatedStore<S> {
    async fn get(&self, table: &str) -> Result<Vec<Value>> {
        self.gate.with_auth(|| self.inner.get(table)).await
    }

    async fn put(&self, path: &str, record: Value) -> Result<()> {
        self.gate.with_auth(|| self.inner.put(path, record)).await
    }

    async fn update(&self, path: &str, partial: Value) -> Result<()> {
        self.gate.with_auth(|| self.inner.update(path, partial)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.gate.with_auth(|| self.inner.delete(path)).await
    }

    async fn get_by_key(&self, table: &str, key: &str, value: &str) -> Result<Option<Value>> {
        self.gate
            .with_auth(|| self.inner.get_by_key(table, key, value))
            .await
    }

    async fn find_by_key(&self, table: &str, key: &str, value: &str) -> Result<Vec<Value>> {
        self.gate
            .with_auth(|| self.inner.find_by_key(table, key, value))
            .await
    }
}
