//! Per-transaction state and the worker-facing reporting surface
//!
//! A [`TransactionContext`] is created by the host for every dispatched
//! request. Clones share state, so the host keeps one to cancel and observe
//! while the worker thread holds another to report through.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use pk_errors::{BackendError, Error, ErrorKind};
use pk_events::{EventEmitter, EventMeta, EventSender, EventSource, TransactionEvent};
use pk_types::{ExitStatus, InfoKind, PackageRecord, Role, StatusKind, TransactionId};
use tracing::{debug, error, warn};

use crate::cancel::{remaining_until, CancellationToken};
use crate::request::Request;

/// Lifecycle of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TransactionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl From<ExitStatus> for TransactionState {
    fn from(exit: ExitStatus) -> Self {
        match exit {
            ExitStatus::Success => Self::Completed,
            ExitStatus::Cancelled => Self::Cancelled,
            ExitStatus::Failed => Self::Failed,
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Progress {
    state: TransactionState,
    status: StatusKind,
    percentage: Option<u8>,
    error: Option<BackendError>,
}

#[derive(Debug)]
struct Shared {
    id: TransactionId,
    request: Request,
    token: CancellationToken,
    sender: Option<EventSender>,
    poll_interval: Duration,
    started_at: Instant,
    sequence: AtomicU64,
    finished: AtomicBool,
    closing: AtomicBool,
    progress: Mutex<Progress>,
    settled: Condvar,
}

/// Handle to one in-flight transaction
#[derive(Debug, Clone)]
pub struct TransactionContext {
    inner: Arc<Shared>,
}

impl TransactionContext {
    /// Create a pending transaction for `request`.
    ///
    /// Events go to `sender` when one is given; `poll_interval` bounds how
    /// long [`TransactionContext::pause`] sleeps between cancellation checks.
    #[must_use]
    pub fn new(request: Request, sender: Option<EventSender>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Shared {
                id: TransactionId::new(),
                request,
                token: CancellationToken::new(),
                sender,
                poll_interval,
                started_at: Instant::now(),
                sequence: AtomicU64::new(0),
                finished: AtomicBool::new(false),
                closing: AtomicBool::new(false),
                progress: Mutex::new(Progress {
                    state: TransactionState::Pending,
                    status: StatusKind::Setup,
                    percentage: None,
                    error: None,
                }),
                settled: Condvar::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.inner.id
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.request.role()
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.progress().state
    }

    #[must_use]
    pub fn status(&self) -> StatusKind {
        self.progress().status
    }

    /// Last reported percentage, `None` until the worker reports one
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.progress().percentage
    }

    /// Error reported on this transaction, if any
    #[must_use]
    pub fn error(&self) -> Option<BackendError> {
        self.progress().error.clone()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Raise this transaction's cancellation token
    pub fn cancel(&self) {
        debug!(transaction = %self.id(), "cancellation requested");
        self.inner.token.raise();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_raised()
    }

    /// Yield point for workers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TransactionCancelled` once cancellation is raised.
    pub fn checkpoint(&self) -> Result<(), BackendError> {
        self.inner.token.checkpoint()
    }

    /// Sleep for up to `duration`, waking at least every poll interval and
    /// immediately on cancellation. Returns whether cancellation is raised.
    #[must_use]
    pub fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            let remaining = remaining_until(deadline);
            if remaining.is_zero() {
                return self.is_cancelled();
            }
            if self
                .inner
                .token
                .wait_timeout(remaining.min(self.inner.poll_interval))
            {
                return true;
            }
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    /// Report a new status.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` after the transaction finished.
    pub fn set_status(&self, status: StatusKind) -> Result<(), BackendError> {
        self.ensure_open("status")?;
        self.progress().status = status;
        self.emit_status(status);
        Ok(())
    }

    /// Report progress in the range 0 to 100.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidArgument` above 100 and
    /// `BackendError::ProtocolViolation` after the transaction finished.
    pub fn set_percentage(&self, percentage: u8) -> Result<(), BackendError> {
        self.ensure_open("percentage")?;
        if percentage > 100 {
            return Err(BackendError::invalid_argument(format!(
                "percentage {percentage} is out of range"
            )));
        }
        self.progress().percentage = Some(percentage);
        self.emit_percentage(percentage);
        Ok(())
    }

    /// Report a discovered package from its text parts.
    ///
    /// # Errors
    ///
    /// Returns a package error for a malformed package id and a
    /// `BackendError::ProtocolViolation` after the transaction finished.
    pub fn package(
        &self,
        info: InfoKind,
        package_id: &str,
        summary: Option<&str>,
    ) -> Result<(), Error> {
        let record = PackageRecord::from_parts(info, package_id, summary)?;
        self.package_record(record)?;
        Ok(())
    }

    /// Report an already-built package record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` after the transaction finished.
    pub fn package_record(&self, record: PackageRecord) -> Result<(), BackendError> {
        self.ensure_open("package")?;
        self.emit_package(record);
        Ok(())
    }

    /// Report the transaction's error. Only one error may be reported.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` if an error was already
    /// reported or the transaction finished.
    pub fn error_code(&self, err: &BackendError) -> Result<(), BackendError> {
        self.ensure_open("error")?;
        {
            let mut progress = self.progress();
            if let Some(existing) = &progress.error {
                warn!(
                    transaction = %self.id(),
                    existing = %existing,
                    rejected = %err,
                    "error already reported"
                );
                return Err(BackendError::protocol("an error was already reported"));
            }
            progress.error = Some(err.clone());
        }
        self.emit_error(err);
        Ok(())
    }

    /// Signal the terminal transition. Must be called exactly once.
    ///
    /// The exit status follows from the reported error: none means success,
    /// a cancellation error means cancelled, anything else means failed.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` on a second call.
    pub fn finish(&self) -> Result<ExitStatus, BackendError> {
        if self.inner.finished.swap(true, Ordering::AcqRel) {
            error!(transaction = %self.id(), "finished called more than once");
            return Err(BackendError::protocol("finished called more than once"));
        }

        let exit = {
            let mut progress = self.progress();
            let exit = match progress.error.as_ref().map(BackendError::kind) {
                None => ExitStatus::Success,
                Some(ErrorKind::TransactionCancelled) => ExitStatus::Cancelled,
                Some(_) => ExitStatus::Failed,
            };
            progress.state = exit.into();
            progress.status = StatusKind::Finished;
            exit
        };

        self.emit_finished(exit, self.elapsed());
        self.inner.settled.notify_all();
        debug!(transaction = %self.id(), exit = %exit, "transaction finished");
        Ok(exit)
    }

    /// Block until the transaction reaches a terminal state or `timeout`
    /// elapses. Returns whether it is finished.
    #[must_use]
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut progress = self.progress();
        while !progress.state.is_terminal() {
            let remaining = remaining_until(deadline);
            if remaining.is_zero() {
                return false;
            }
            progress = self
                .inner
                .settled
                .wait_timeout(progress, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Move from pending to running when a worker takes the transaction.
    pub(crate) fn mark_running(&self) -> Result<(), BackendError> {
        let mut progress = self.progress();
        if progress.state != TransactionState::Pending {
            return Err(BackendError::protocol(format!(
                "cannot start a worker on a {} transaction",
                progress.state
            )));
        }
        progress.state = TransactionState::Running;
        Ok(())
    }

    /// Attribute further events to the scheduler, which is closing the
    /// transaction on the task's behalf.
    pub(crate) fn mark_closing(&self) {
        self.inner.closing.store(true, Ordering::Release);
    }

    fn ensure_open(&self, what: &str) -> Result<(), BackendError> {
        if self.is_finished() {
            warn!(transaction = %self.id(), what, "report after finish rejected");
            Err(BackendError::protocol(format!(
                "{what} reported after the transaction finished"
            )))
        } else {
            Ok(())
        }
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.inner
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventEmitter for TransactionContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.inner.sender.as_ref()
    }

    fn event_meta(&self, event: &TransactionEvent) -> EventMeta {
        let source = match event {
            TransactionEvent::Started { .. } => EventSource::HOST,
            _ if self.inner.closing.load(Ordering::Acquire) => EventSource::SCHEDULER,
            _ => EventSource::WORKER,
        };
        EventMeta::new(event.log_level(), source)
            .with_transaction(self.inner.id)
            .with_sequence(self.inner.sequence.fetch_add(1, Ordering::Relaxed))
    }
}
