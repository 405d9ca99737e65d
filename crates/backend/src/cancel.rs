//! Cooperative cancellation
//!
//! A token is raised by the transaction owner and polled by the worker at
//! its yield points. Raising never interrupts a worker; it only wakes one
//! that is parked in [`CancellationToken::wait_timeout`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use pk_errors::BackendError;

/// Shared, clone-able cancellation signal for one transaction
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    raised: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Idempotent and safe from any thread.
    pub fn raise(&self) {
        if self.inner.raised.swap(true, Ordering::AcqRel) {
            return;
        }
        // Take the lock so a waiter between its flag check and its wait
        // cannot miss the notification.
        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.wakeup.notify_all();
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::Acquire)
    }

    /// Check for cancellation at a yield point.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TransactionCancelled` once the token is raised.
    pub fn checkpoint(&self) -> Result<(), BackendError> {
        if self.is_raised() {
            Err(BackendError::cancelled("The thread was stopped successfully"))
        } else {
            Ok(())
        }
    }

    /// Park for up to `timeout`, returning early if the token is raised.
    ///
    /// Returns whether the token is raised on exit.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        while !self.is_raised() {
            let remaining = remaining_until(deadline);
            if remaining.is_zero() {
                break;
            }
            guard = self
                .inner
                .wakeup
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        self.is_raised()
    }
}

/// Time left before `deadline`; `None` is a deadline past the clock's range.
pub(crate) fn remaining_until(deadline: Option<Instant>) -> Duration {
    deadline.map_or(Duration::MAX, |deadline| {
        deadline.saturating_duration_since(Instant::now())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_raise_is_idempotent() {
        let token = CancellationToken::new();
        assert!(!token.is_raised());
        assert!(token.checkpoint().is_ok());

        token.raise();
        token.raise();
        assert!(token.is_raised());
        assert!(matches!(
            token.checkpoint(),
            Err(BackendError::TransactionCancelled { .. })
        ));
    }

    #[test]
    fn test_clones_share_signal() {
        let owner = CancellationToken::new();
        let worker = owner.clone();
        owner.raise();
        assert!(worker.is_raised());
    }

    #[test]
    fn test_separate_tokens_do_not_interfere() {
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        first.raise();
        assert!(!second.is_raised());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token = CancellationToken::new();
        let started = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_timeout_wakes_on_raise() {
        let token = CancellationToken::new();
        let raiser = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            raiser.raise();
        });

        let started = Instant::now();
        assert!(token.wait_timeout(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_unbounded_wait_wakes_on_raise() {
        let token = CancellationToken::new();
        let raiser = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            raiser.raise();
        });

        assert!(token.wait_timeout(Duration::MAX));
        handle.join().unwrap();
    }

    #[test]
    fn test_remaining_until_past_clock_range() {
        assert_eq!(remaining_until(None), Duration::MAX);
        assert_eq!(remaining_until(Some(Instant::now())), Duration::ZERO);
    }
}
