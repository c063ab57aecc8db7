//! Cooperative shutdown token
//!
//! One token per coordinator instance, cloned into whatever needs to
//! request shutdown: the control handle, the signal task, tests. The event
//! loop observes it at loop-top only, so tripping it never preempts an
//! in-flight wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Cloneable cancellation token with a recorded shutdown reason
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. The first caller's reason is the one recorded.
    pub fn trigger(&self, reason: impl Into<String>) {
        let mut slot = self.inner.reason.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(reason.into());
        }
        drop(slot);
        self.inner.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// The reason recorded by the first trigger call
    pub fn reason(&self) -> Option<String> {
        self.inner.reason.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_untriggered() {
        let token = ShutdownToken::new();
        assert!(!token.is_triggered());
        assert!(token.reason().is_none());
    }

    #[test]
    fn test_trigger_records_reason() {
        let token = ShutdownToken::new();
        token.trigger("SIGTERM received");
        assert!(token.is_triggered());
        assert_eq!(token.reason().as_deref(), Some("SIGTERM received"));
    }

    #[test]
    fn test_first_reason_wins() {
        let token = ShutdownToken::new();
        token.trigger("first");
        token.trigger("second");
        assert_eq!(token.reason().as_deref(), Some("first"));
    }

    #[test]
    fn test_clones_share_state() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        clone.trigger("via clone");
        assert!(token.is_triggered());
        assert_eq!(token.reason().as_deref(), Some("via clone"));
    }
}
