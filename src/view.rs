//! Request lifetimes bound to the view that started them.
//!
//! Every request a view issues goes through its `ViewScope`. Tearing the
//! view down (`cancel()` or drop) aborts whatever is still in flight and the
//! caller sees `AppError::Cancelled` instead of a late result.

use futures::future::{AbortHandle, Abortable, Aborted};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::notify::{Notifier, Toast};

pub struct ViewScope {
    name: String,
    notifier: Arc<dyn Notifier>,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
    cancelled: AtomicBool,
}

impl ViewScope {
    pub fn new(name: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            name: name.into(),
            notifier,
            in_flight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Run a request tied to this view
    pub async fn run<F, T>(&self, request: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let (id, abortable) = self.register(request)?;
        let outcome = abortable.await;
        self.lock().remove(&id);
        flatten(outcome)
    }

    /// Like `run`, on a separate task. The abort handle stays registered until the scope ends.
    pub fn spawn<F, T>(&self, request: F) -> Result<JoinHandle<Result<T, AppError>>, AppError>
    where
        F: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let (_, abortable) = self.register(request)?;
        Ok(tokio::spawn(async move { flatten(abortable.await) }))
    }

    /// Run a user action. Failures become error toasts and are not propagated;
    /// a cancelled action is dropped silently since its view is gone.
    pub async fn action<F, T>(&self, request: F, success: Option<&str>, fallback: &str) -> Option<T>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match self.run(request).await {
            Ok(value) => {
                if let Some(message) = success {
                    self.notifier.success(message);
                }
                Some(value)
            }
            Err(AppError::Cancelled) => {
                tracing::debug!("{}: request cancelled", self.name);
                None
            }
            Err(e) => {
                tracing::warn!("{}: {}", self.name, e);
                self.notifier.notify(Toast::from_error(&e, fallback));
                None
            }
        }
    }

    /// Abort everything in flight and refuse new requests
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let handles: Vec<AbortHandle> = self.lock().drain().map(|(_, h)| h).collect();
        if !handles.is_empty() {
            tracing::debug!("{}: aborting {} request(s)", self.name, handles.len());
        }
        for handle in handles {
            handle.abort();
        }
    }

    fn register<F: Future>(&self, request: F) -> Result<(u64, Abortable<F>), AppError> {
        if self.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let (handle, registration) = AbortHandle::new_pair();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, handle);
        Ok((id, Abortable::new(request, registration)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn flatten<T>(outcome: Result<Result<T, AppError>, Aborted>) -> Result<T, AppError> {
    outcome.unwrap_or(Err(AppError::Cancelled))
}
