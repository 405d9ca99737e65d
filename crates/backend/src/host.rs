//! Backend host
//!
//! Owns one loaded backend: runs its lifecycle hooks, validates and
//! dispatches requests, and tracks the single outstanding transaction so
//! cancellation reaches the right worker.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pk_config::WorkerConfig;
use pk_errors::{BackendError, Error};
use pk_events::{EventEmitter, EventSender};
use pk_types::{FilterSet, GroupKind, Role};
use tracing::{debug, info, warn};

use crate::capability::{CapabilityTable, Dispatch};
use crate::request::Request;
use crate::transaction::{TransactionContext, TransactionState};
use crate::worker::{close_with_error, WorkerScheduler};

/// Upper bound on how long `destroy` waits for a cancelled worker
const DESTROY_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Loaded,
    Initialized,
    Destroyed,
}

#[derive(Debug)]
pub struct BackendHost {
    table: CapabilityTable,
    scheduler: WorkerScheduler,
    poll_interval: Duration,
    sender: Option<EventSender>,
    lifecycle: Mutex<Lifecycle>,
    current: Mutex<Option<TransactionContext>>,
}

impl BackendHost {
    /// Load a backend. Its initialize hook runs on [`BackendHost::initialize`].
    #[must_use]
    pub fn new(table: CapabilityTable, config: &WorkerConfig, sender: Option<EventSender>) -> Self {
        Self {
            table,
            scheduler: WorkerScheduler::new(config),
            poll_interval: config.poll_interval(),
            sender,
            lifecycle: Mutex::new(Lifecycle::Loaded),
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilityTable {
        &self.table
    }

    #[must_use]
    pub fn supports(&self, role: Role) -> bool {
        self.table.supports(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.table.roles()
    }

    /// Run the backend's initialize hook. Allowed once.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` if already initialized or
    /// destroyed, or the hook's own error.
    pub fn initialize(&self) -> Result<(), Error> {
        let mut lifecycle = lock(&self.lifecycle);
        if *lifecycle != Lifecycle::Loaded {
            return Err(BackendError::protocol("backend already initialized").into());
        }
        self.table.run_initialize()?;
        *lifecycle = Lifecycle::Initialized;
        info!(backend = self.table.description(), "backend initialized");
        Ok(())
    }

    /// Cancel any outstanding work and run the destroy hook. Allowed once,
    /// after initialize.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ProtocolViolation` outside the initialized
    /// state, or the hook's own error.
    pub fn destroy(&self) -> Result<(), Error> {
        let mut lifecycle = lock(&self.lifecycle);
        match *lifecycle {
            Lifecycle::Initialized => {}
            Lifecycle::Loaded => {
                return Err(BackendError::protocol("backend was never initialized").into())
            }
            Lifecycle::Destroyed => {
                return Err(BackendError::protocol("backend already destroyed").into())
            }
        }
        *lifecycle = Lifecycle::Destroyed;
        drop(lifecycle);

        if let Some(ctx) = self.outstanding() {
            ctx.cancel();
            if !ctx.wait_finished(DESTROY_GRACE) {
                warn!(transaction = %ctx.id(), "worker still running at destroy");
            }
        }

        self.table.run_destroy()?;
        info!(backend = self.table.description(), "backend destroyed");
        Ok(())
    }

    /// Start a transaction for `request`.
    ///
    /// Argument and capability problems are returned before any transaction
    /// exists. Once the handler runs, the returned context carries all
    /// further results.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed request, `NotSupported` for
    /// an unbound role, `ProtocolViolation` outside the initialized state or
    /// while another transaction is outstanding, and the handler's error if
    /// it fails. A handler that fails after starting a worker leaves that
    /// worker running; its transaction stays reachable through
    /// [`BackendHost::current`] and finishes through the event stream.
    pub fn dispatch(&self, request: Request) -> Result<TransactionContext, Error> {
        if *lock(&self.lifecycle) != Lifecycle::Initialized {
            return Err(BackendError::protocol("backend is not initialized").into());
        }
        request.validate()?;
        let role = request.role();
        if !self.table.supports(role) {
            return Err(BackendError::not_supported(role.as_str()).into());
        }

        let mut current = lock(&self.current);
        if let Some(ctx) = current.as_ref().filter(|ctx| !ctx.is_finished()) {
            return Err(BackendError::protocol(format!(
                "transaction {} is still in progress",
                ctx.id()
            ))
            .into());
        }

        let ctx = TransactionContext::new(request, self.sender.clone(), self.poll_interval);
        debug!(transaction = %ctx.id(), role = %role, "dispatching");
        ctx.emit_started(role);
        *current = Some(ctx.clone());
        drop(current);

        if let Err(err) = self.table.invoke(&Dispatch::new(&ctx, &self.scheduler)) {
            // A running worker owns closing the transaction.
            if ctx.state() == TransactionState::Pending && !ctx.is_finished() {
                close_with_error(&ctx, &err.to_backend());
            } else {
                warn!(transaction = %ctx.id(), error = %err, "handler failed after starting a worker");
            }
            return Err(err);
        }

        if ctx.state() == TransactionState::Pending && !ctx.is_finished() {
            warn!(transaction = %ctx.id(), "handler neither finished nor started a worker");
            let _ = ctx.finish();
        }

        Ok(ctx)
    }

    /// Dispatch a name search
    ///
    /// # Errors
    ///
    /// See [`BackendHost::dispatch`].
    pub fn search_name(&self, filters: FilterSet, search: impl Into<String>) -> Result<TransactionContext, Error> {
        self.dispatch(Request::SearchName {
            filters,
            search: search.into(),
        })
    }

    /// Dispatch a group search
    ///
    /// # Errors
    ///
    /// See [`BackendHost::dispatch`].
    pub fn search_group(&self, filters: FilterSet, group: GroupKind) -> Result<TransactionContext, Error> {
        self.dispatch(Request::SearchGroup { filters, group })
    }

    /// Request cancellation of the outstanding transaction.
    ///
    /// Returns whether a running transaction was signalled. The token is
    /// raised by the host; the backend's hook runs afterwards.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotSupported` if the backend binds no cancel
    /// hook.
    pub fn cancel(&self) -> Result<bool, BackendError> {
        if !self.table.supports_cancel() {
            return Err(BackendError::not_supported("cancel"));
        }
        let Some(ctx) = self.outstanding() else {
            debug!("cancel requested with nothing outstanding");
            return Ok(false);
        };
        ctx.cancel();
        self.table.run_cancel(&ctx)?;
        Ok(true)
    }

    /// The most recent transaction, finished or not
    #[must_use]
    pub fn current(&self) -> Option<TransactionContext> {
        lock(&self.current).clone()
    }

    fn outstanding(&self) -> Option<TransactionContext> {
        self.current().filter(|ctx| !ctx.is_finished())
    }
}

impl Drop for BackendHost {
    fn drop(&mut self) {
        if *lock(&self.lifecycle) == Lifecycle::Initialized {
            if let Err(err) = self.destroy() {
                warn!(error = %err, "destroy on drop failed");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
