//! Dispatch observability callbacks.
//!
//! The registry is the only mutable state shared between renderer copies:
//! every `with_*` copy of a renderer sees the same callbacks. Callbacks run
//! outside the registry lock, so a callback may register further callbacks.

use crate::envelope::Status;
use http::StatusCode;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// What a callback learns about one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEvent {
    pub status: Status,
    pub code: StatusCode,
    pub content_type: String,
    pub bytes_written: usize,
    /// Rendered fault, for error callbacks.
    pub error: Option<String>,
    pub request_id: Option<String>,
    /// Part of a streaming response.
    pub streamed: bool,
}

pub type Callback = Arc<dyn Fn(&DispatchEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    success: Vec<Callback>,
    error: Vec<Callback>,
}

/// Shared success and error callback lists.
#[derive(Clone, Default)]
pub struct Hooks {
    registry: Arc<Mutex<Registry>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Registry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `callback` after every successful write.
    pub fn on_success<F>(&self, callback: F)
    where
        F: Fn(&DispatchEvent) + Send + Sync + 'static,
    {
        self.lock().success.push(Arc::new(callback));
    }

    /// Run `callback` after every failed dispatch.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&DispatchEvent) + Send + Sync + 'static,
    {
        self.lock().error.push(Arc::new(callback));
    }

    pub(crate) fn fire_success(&self, event: &DispatchEvent) {
        let callbacks = self.lock().success.clone();
        callbacks.iter().for_each(|cb| cb(event));
    }

    pub(crate) fn fire_error(&self, event: &DispatchEvent) {
        let callbacks = self.lock().error.clone();
        callbacks.iter().for_each(|cb| cb(event));
    }

    pub fn clear(&self) {
        let mut registry = self.lock();
        registry.success.clear();
        registry.error.clear();
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("Hooks")
            .field("success", &registry.success.len())
            .field("error", &registry.error.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> DispatchEvent {
        DispatchEvent {
            status: Status::Ok,
            code: StatusCode::OK,
            content_type: "application/json".into(),
            bytes_written: 2,
            error: None,
            request_id: None,
            streamed: false,
        }
    }

    #[test]
    fn clones_share_callbacks() {
        let hooks = Hooks::new();
        let copy = hooks.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        copy.on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hooks.fire_success(&event());
        hooks.fire_error(&event());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_register_more() {
        let hooks = Hooks::new();
        let inner = hooks.clone();
        hooks.on_error(move |_| inner.on_error(|_| {}));
        hooks.fire_error(&event());
        assert_eq!(format!("{hooks:?}"), "Hooks { success: 0, error: 2 }");
    }
}
