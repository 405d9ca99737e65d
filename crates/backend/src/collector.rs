//! Folding a transaction's event stream into a result

use std::time::Duration;

use pk_errors::{BackendError, ErrorKind};
use pk_events::{EventMessage, EventReceiver, TransactionEvent};
use pk_types::{ExitStatus, PackageList, Role, StatusKind, TransactionId};
use tracing::debug;

/// Everything one transaction reported
#[derive(Debug, Clone, Default)]
pub struct TransactionOutcome {
    pub transaction_id: Option<TransactionId>,
    pub role: Option<Role>,
    pub packages: PackageList,
    pub statuses: Vec<StatusKind>,
    pub percentages: Vec<u8>,
    pub errors: Vec<(ErrorKind, String)>,
    pub exit: Option<ExitStatus>,
    pub runtime: Option<Duration>,
}

impl TransactionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit.is_some_and(ExitStatus::is_success)
    }

    /// Highest percentage reported
    #[must_use]
    pub fn max_percentage(&self) -> Option<u8> {
        self.percentages.iter().copied().max()
    }

    /// The reported error as a backend error
    #[must_use]
    pub fn error(&self) -> Option<BackendError> {
        self.errors.first().map(|(kind, details)| match kind {
            ErrorKind::InvalidArgument => BackendError::invalid_argument(details.clone()),
            ErrorKind::NotSupported => BackendError::not_supported(details.clone()),
            ErrorKind::TransactionCancelled => BackendError::cancelled(details.clone()),
            ErrorKind::TransactionFailed => BackendError::failed(details.clone()),
            ErrorKind::ProtocolViolation => BackendError::protocol(details.clone()),
        })
    }
}

/// Accumulates events until the transaction finishes
#[derive(Debug, Default)]
pub struct TransactionCollector {
    outcome: TransactionOutcome,
}

impl TransactionCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one message in. Returns true once the terminal event is seen.
    pub fn observe(&mut self, message: &EventMessage) -> bool {
        let outcome = &mut self.outcome;
        if outcome.transaction_id.is_none() {
            outcome.transaction_id = message.meta.transaction_id;
        }

        match &message.event {
            TransactionEvent::Started { role } => outcome.role = Some(*role),
            TransactionEvent::StatusChanged { status } => outcome.statuses.push(*status),
            TransactionEvent::Percentage { percentage } => outcome.percentages.push(*percentage),
            TransactionEvent::Package { record } => {
                outcome.packages.add_item(record);
            }
            TransactionEvent::ErrorCode { kind, details } => {
                outcome.errors.push((*kind, details.clone()));
            }
            TransactionEvent::Finished { exit, runtime } => {
                outcome.exit = Some(*exit);
                outcome.runtime = Some(*runtime);
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn into_outcome(self) -> TransactionOutcome {
        self.outcome
    }

    /// Receive until the next `Finished` event.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TransactionFailed` if the channel closes first.
    pub async fn collect(receiver: &mut EventReceiver) -> Result<TransactionOutcome, BackendError> {
        let mut collector = Self::new();
        while let Some(message) = receiver.recv().await {
            if collector.observe(&message) {
                return Ok(collector.finish());
            }
        }
        Err(channel_closed())
    }

    /// Blocking variant of [`TransactionCollector::collect`] for threads
    /// outside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TransactionFailed` if the channel closes first.
    pub fn collect_blocking(receiver: &mut EventReceiver) -> Result<TransactionOutcome, BackendError> {
        let mut collector = Self::new();
        while let Some(message) = receiver.blocking_recv() {
            if collector.observe(&message) {
                return Ok(collector.finish());
            }
        }
        Err(channel_closed())
    }

    fn finish(self) -> TransactionOutcome {
        debug!(
            transaction = ?self.outcome.transaction_id,
            packages = self.outcome.packages.len(),
            exit = ?self.outcome.exit,
            "collected transaction"
        );
        self.outcome
    }
}

fn channel_closed() -> BackendError {
    BackendError::failed("event channel closed before the transaction finished")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_events::{EventSource, TransactionEvent};
    use pk_types::{InfoKind, PackageRecord};

    fn message(event: TransactionEvent) -> EventMessage {
        EventMessage::from_event(event, EventSource::WORKER)
    }

    fn record(id: &str) -> PackageRecord {
        PackageRecord::from_parts(InfoKind::Available, id, Some("summary")).unwrap()
    }

    #[test]
    fn test_observe_dedups_packages() {
        let mut collector = TransactionCollector::new();
        for id in ["glib2;2.14.0;i386;fedora", "glib2;2.14.0;i386;updates"] {
            assert!(!collector.observe(&message(TransactionEvent::Package { record: record(id) })));
        }
        assert!(collector.observe(&message(TransactionEvent::Finished {
            exit: ExitStatus::Success,
            runtime: Duration::from_millis(3),
        })));

        let outcome = collector.into_outcome();
        assert_eq!(outcome.packages.len(), 1);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_error_rebuilt_from_kind() {
        let mut collector = TransactionCollector::new();
        collector.observe(&message(TransactionEvent::error(&BackendError::cancelled(
            "stopped",
        ))));
        let outcome = collector.into_outcome();
        let err = outcome.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::TransactionCancelled);
        assert_eq!(err.details(), "stopped");
    }

    #[tokio::test]
    async fn test_collect_stops_at_finished() {
        let (tx, mut rx) = pk_events::channel();
        tx.send(message(TransactionEvent::Percentage { percentage: 40 })).unwrap();
        tx.send(message(TransactionEvent::Finished {
            exit: ExitStatus::Failed,
            runtime: Duration::ZERO,
        }))
        .unwrap();
        tx.send(message(TransactionEvent::Percentage { percentage: 90 })).unwrap();

        let outcome = TransactionCollector::collect(&mut rx).await.unwrap();
        assert_eq!(outcome.percentages, vec![40]);
        assert_eq!(outcome.exit, Some(ExitStatus::Failed));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_collect_reports_closed_channel() {
        let (tx, mut rx) = pk_events::channel();
        tx.send(message(TransactionEvent::StatusChanged {
            status: StatusKind::Query,
        }))
        .unwrap();
        drop(tx);

        let err = TransactionCollector::collect(&mut rx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    }

    #[test]
    fn test_collect_blocking() {
        let (tx, mut rx) = pk_events::channel();
        let handle = std::thread::spawn(move || {
            tx.send(message(TransactionEvent::Finished {
                exit: ExitStatus::Cancelled,
                runtime: Duration::ZERO,
            }))
            .unwrap();
        });

        let outcome = TransactionCollector::collect_blocking(&mut rx).unwrap();
        assert_eq!(outcome.exit, Some(ExitStatus::Cancelled));
        handle.join().unwrap();
    }
}
