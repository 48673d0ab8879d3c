use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

#[derive(Debug, Default)]
struct Interrupt {
    stopped: AtomicBool,
    reason: OnceLock<String>,
}

/// A cloneable handle used to ask a running tracer to stop, possibly from another thread.
///
/// Stopping is cooperative: the tracer checks the flag when it processes a step, and may keep
/// receiving hooks afterwards. Only the first reason is kept.
#[derive(Debug, Default, Clone)]
pub struct InterruptHandle {
    inner: Arc<Interrupt>,
}

impl InterruptHandle {
    /// Creates a new, unset [`InterruptHandle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Calling this more than once keeps the first reason.
    pub fn stop(&self, reason: impl Into<String>) {
        let _ = self.inner.reason.set(reason.into());
        self.inner.stopped.store(true, Ordering::Release);
    }

    /// Whether [`InterruptHandle::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// The reason recorded by the first [`InterruptHandle::stop`] call.
    pub fn reason(&self) -> Option<&str> {
        self.inner.reason.get().map(String::as_str)
    }
}
