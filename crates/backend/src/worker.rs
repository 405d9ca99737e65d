//! Independent worker threads for long-running transactions
//!
//! The dispatching caller gets control back as soon as the thread is
//! spawned. The task reports through its [`TransactionContext`]; whatever it
//! leaves unfinished the scheduler closes so every transaction ends with
//! exactly one `Finished` event.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use pk_config::WorkerConfig;
use pk_errors::{BackendError, Error, ErrorKind};
use pk_types::TransactionId;
use tracing::{debug, error, warn};

use crate::transaction::TransactionContext;

/// Spawns one OS thread per started transaction
#[derive(Debug, Clone)]
pub struct WorkerScheduler {
    thread_name_prefix: String,
}

impl WorkerScheduler {
    #[must_use]
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            thread_name_prefix: config.thread_name_prefix.clone(),
        }
    }

    /// Run `task` on a new thread bound to `context`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` if the context already has
    /// a worker or has finished, and `BackendError::TransactionFailed` if the
    /// thread cannot be spawned. A spawn failure is also reported on the
    /// context, which is then finished.
    pub fn start<F>(&self, context: &TransactionContext, task: F) -> Result<WorkerHandle, BackendError>
    where
        F: FnOnce(&TransactionContext) -> Result<(), Error> + Send + 'static,
    {
        context.mark_running()?;

        let worker_ctx = context.clone();
        let name = format!("{}-{}", self.thread_name_prefix, context.role());
        let spawned = thread::Builder::new()
            .name(name)
            .spawn(move || run_task(&worker_ctx, task));

        match spawned {
            Ok(handle) => {
                debug!(transaction = %context.id(), role = %context.role(), "worker started");
                Ok(WorkerHandle {
                    transaction_id: context.id(),
                    handle,
                })
            }
            Err(err) => {
                let err = BackendError::failed(format!("failed to spawn worker thread: {err}"));
                close_with_error(context, &err);
                Err(err)
            }
        }
    }
}

/// Join handle for a worker thread
#[derive(Debug)]
pub struct WorkerHandle {
    transaction_id: TransactionId,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker thread to exit.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the thread panicked outside the task.
    pub fn join(self) -> Result<(), Error> {
        self.handle
            .join()
            .map_err(|_| Error::internal(format!("worker for {} panicked", self.transaction_id)))
    }
}

fn run_task<F>(ctx: &TransactionContext, task: F)
where
    F: FnOnce(&TransactionContext) -> Result<(), Error>,
{
    debug!(transaction = %ctx.id(), "started task");

    match panic::catch_unwind(AssertUnwindSafe(|| task(ctx))) {
        Ok(Ok(())) => {
            if !ctx.is_finished() {
                warn!(transaction = %ctx.id(), "task returned without finishing");
                ctx.mark_closing();
                let _ = ctx.finish();
            }
        }
        Ok(Err(err)) => {
            if err.is_cancelled() {
                debug!(transaction = %ctx.id(), "task stopped at a cancellation checkpoint");
            }
            let err = err.to_backend();
            if ctx.is_finished() {
                error!(transaction = %ctx.id(), error = %err, "task failed after finishing");
            } else {
                close_with_error(ctx, &err);
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(transaction = %ctx.id(), panic = %message, "task panicked");
            if !ctx.is_finished() {
                close_with_error(ctx, &BackendError::failed(format!("worker panicked: {message}")));
            }
        }
    }

    debug!(transaction = %ctx.id(), "exited task");
}

/// Report `err` unless an error is already on the context, then finish.
pub(crate) fn close_with_error(ctx: &TransactionContext, err: &BackendError) {
    ctx.mark_closing();
    if ctx.error().is_none() {
        let _ = ctx.error_code(err);
    } else if err.kind() != ErrorKind::TransactionCancelled {
        warn!(transaction = %ctx.id(), error = %err, "dropping second error");
    }
    let _ = ctx.finish();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::transaction::TransactionState;
    use pk_events::{EventReceiver, TransactionEvent};
    use pk_types::{ExitStatus, InfoKind, StatusKind};
    use std::time::Duration;

    fn setup() -> (WorkerScheduler, TransactionContext, EventReceiver) {
        let config = WorkerConfig {
            poll_interval_ms: 10,
            thread_name_prefix: "test-worker".to_string(),
        };
        let (tx, rx) = pk_events::channel();
        let ctx = TransactionContext::new(Request::UpdateSystem, Some(tx), config.poll_interval());
        (WorkerScheduler::new(&config), ctx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<TransactionEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            events.push(message.event);
        }
        events
    }

    fn finished_count(events: &[TransactionEvent]) -> usize {
        events.iter().filter(|e| e.is_finished()).count()
    }

    #[test]
    fn test_task_runs_on_named_thread() {
        let (scheduler, ctx, mut rx) = setup();
        let (name_tx, name_rx) = std::sync::mpsc::channel();
        let handle = scheduler
            .start(&ctx, move |ctx| {
                let _ = name_tx.send(thread::current().name().map(str::to_string));
                ctx.set_status(StatusKind::Update)?;
                ctx.package(InfoKind::Updating, "glib2;2.14.0;i386;fedora", None)?;
                ctx.finish()?;
                Ok(())
            })
            .unwrap();
        handle.join().unwrap();

        assert_eq!(
            name_rx.recv().unwrap().as_deref(),
            Some("test-worker-update-system")
        );
        let events = drain(&mut rx);
        assert_eq!(finished_count(&events), 1);
        assert_eq!(ctx.state(), TransactionState::Completed);
    }

    #[test]
    fn test_start_twice_rejected() {
        let (scheduler, ctx, _rx) = setup();
        let first = scheduler.start(&ctx, |ctx| {
            let _ = ctx.pause(Duration::from_millis(50));
            ctx.finish()?;
            Ok(())
        });
        let handle = first.unwrap();

        let err = scheduler.start(&ctx, |_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        handle.join().unwrap();
    }

    #[test]
    fn test_unfinished_success_is_closed() {
        let (scheduler, ctx, mut rx) = setup();
        scheduler
            .start(&ctx, |ctx| {
                ctx.set_status(StatusKind::Query)?;
                Ok(())
            })
            .unwrap()
            .join()
            .unwrap();

        let status = rx.try_recv().unwrap();
        assert_eq!(status.meta.source, pk_events::EventSource::WORKER);
        let finished = rx.try_recv().unwrap();
        assert!(finished.event.is_finished());
        assert_eq!(finished.meta.source, pk_events::EventSource::SCHEDULER);
        assert!(rx.try_recv().is_err());
        assert_eq!(ctx.state(), TransactionState::Completed);
    }

    #[test]
    fn test_error_return_reports_and_finishes() {
        let (scheduler, ctx, mut rx) = setup();
        scheduler
            .start(&ctx, |ctx| {
                ctx.checkpoint()?;
                Err(BackendError::failed("repository unreachable").into())
            })
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            TransactionEvent::ErrorCode {
                kind: ErrorKind::TransactionFailed,
                ..
            }
        )));
        assert!(matches!(
            events.last(),
            Some(TransactionEvent::Finished {
                exit: ExitStatus::Failed,
                ..
            })
        ));
        assert_eq!(ctx.state(), TransactionState::Failed);
    }

    #[test]
    fn test_cancel_checkpoint_finishes_cancelled() {
        let (scheduler, ctx, mut rx) = setup();
        ctx.cancel();
        scheduler
            .start(&ctx, |ctx| {
                ctx.checkpoint()?;
                ctx.finish()?;
                Ok(())
            })
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(finished_count(&events), 1);
        assert_eq!(ctx.state(), TransactionState::Cancelled);
    }

    #[test]
    fn test_panic_becomes_failure() {
        let (scheduler, ctx, mut rx) = setup();
        scheduler
            .start(&ctx, |_| panic!("backend bug"))
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(finished_count(&events), 1);
        let error = ctx.error().unwrap();
        assert_eq!(error.kind(), ErrorKind::TransactionFailed);
        assert!(error.details().contains("backend bug"));
    }

    #[test]
    fn test_error_after_finish_not_reported() {
        let (scheduler, ctx, mut rx) = setup();
        scheduler
            .start(&ctx, |ctx| {
                ctx.finish()?;
                ctx.finish()?;
                Ok(())
            })
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(finished_count(&events), 1);
        assert!(!events
            .iter()
            .any(|e| matches!(e, TransactionEvent::ErrorCode { .. })));
        assert_eq!(ctx.state(), TransactionState::Completed);
    }
}
