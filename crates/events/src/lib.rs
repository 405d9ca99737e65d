#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Result sink for backend transactions
//!
//! A worker reports status, percentage, discovered packages, errors and the
//! terminal signal through an unbounded channel. Each message carries
//! [`EventMeta`] so hosts can correlate events and forward them to tracing.
//!
//! Sending never blocks, so worker threads that are not running inside a
//! tokio runtime can emit freely.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::TransactionEvent;

use pk_errors::BackendError;
use pk_types::{ExitStatus, PackageRecord, Role, StatusKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its metadata envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: TransactionEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: TransactionEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with default metadata derived from its log level
    #[must_use]
    pub fn from_event(event: TransactionEvent, source: EventSource) -> Self {
        let meta = EventMeta::new(event.log_level(), source);
        Self { meta, event }
    }
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for event receiver
pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting transaction events
///
/// Implementors supply the sender and may override [`EventEmitter::event_meta`]
/// to stamp transaction ids and sequence numbers.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Metadata for the next emitted event
    fn event_meta(&self, event: &TransactionEvent) -> EventMeta {
        EventMeta::new(event.log_level(), EventSource::WORKER)
    }

    /// Emit an event through this emitter
    fn emit(&self, event: TransactionEvent) {
        if let Some(sender) = self.event_sender() {
            let meta = self.event_meta(&event);
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    fn emit_started(&self, role: Role) {
        self.emit(TransactionEvent::Started { role });
    }

    fn emit_status(&self, status: StatusKind) {
        self.emit(TransactionEvent::StatusChanged { status });
    }

    fn emit_percentage(&self, percentage: u8) {
        self.emit(TransactionEvent::Percentage { percentage });
    }

    fn emit_package(&self, record: PackageRecord) {
        self.emit(TransactionEvent::Package { record });
    }

    fn emit_error(&self, error: &BackendError) {
        self.emit(TransactionEvent::error(error));
    }

    fn emit_finished(&self, exit: ExitStatus, runtime: Duration) {
        self.emit(TransactionEvent::Finished { exit, runtime });
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Forward an event to tracing at its own level, tagged with its category
pub fn log_event(message: &EventMessage) {
    let meta = &message.meta;
    let transaction = meta
        .transaction_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    match meta.tracing_level() {
        tracing::Level::ERROR => tracing::error!(
            source = meta.source.as_str(),
            transaction = %transaction,
            sequence = meta.sequence,
            category = message.event.log_target(),
            event = ?message.event,
            "transaction event"
        ),
        tracing::Level::WARN => tracing::warn!(
            source = meta.source.as_str(),
            transaction = %transaction,
            sequence = meta.sequence,
            category = message.event.log_target(),
            event = ?message.event,
            "transaction event"
        ),
        tracing::Level::INFO => tracing::info!(
            source = meta.source.as_str(),
            transaction = %transaction,
            sequence = meta.sequence,
            category = message.event.log_target(),
            event = ?message.event,
            "transaction event"
        ),
        tracing::Level::DEBUG => tracing::debug!(
            source = meta.source.as_str(),
            transaction = %transaction,
            sequence = meta.sequence,
            category = message.event.log_target(),
            event = ?message.event,
            "transaction event"
        ),
        tracing::Level::TRACE => tracing::trace!(
            source = meta.source.as_str(),
            transaction = %transaction,
            sequence = meta.sequence,
            category = message.event.log_target(),
            event = ?message.event,
            "transaction event"
        ),
    }
}
