#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Asynchronous transaction protocol between a host and pluggable backends
//!
//! A backend is a [`CapabilityTable`]: a sparse map from role to handler
//! plus lifecycle and cancel hooks. The [`BackendHost`] validates requests,
//! creates a [`TransactionContext`] per dispatch and lets the handler hand
//! long-running work to the [`WorkerScheduler`]. Workers report status,
//! percentage, packages and errors through the context onto an event
//! channel, ending every transaction with exactly one `Finished` event.

pub mod backends;
pub mod cache;
pub mod cancel;
pub mod capability;
pub mod collector;
pub mod host;
pub mod request;
pub mod transaction;
pub mod worker;

pub use cache::PackageCache;
pub use cancel::CancellationToken;
pub use capability::{
    CancelHook, CapabilityTable, CapabilityTableBuilder, Dispatch, LifecycleHook,
    OperationHandler,
};
pub use collector::{TransactionCollector, TransactionOutcome};
pub use host::BackendHost;
pub use request::Request;
pub use transaction::{TransactionContext, TransactionState};
pub use worker::{WorkerHandle, WorkerScheduler};
