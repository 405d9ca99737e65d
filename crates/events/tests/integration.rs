//! Integration tests for events

#[cfg(test)]
mod tests {
    use pk_errors::{BackendError, ErrorKind};
    use pk_events::*;
    use pk_types::{ExitStatus, InfoKind, PackageRecord, StatusKind};
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_sender_emits_in_order() {
        let (tx, mut rx) = channel();

        tx.emit_status(StatusKind::Query);
        tx.emit_percentage(10);
        tx.emit_error(&BackendError::cancelled("The thread was stopped successfully"));

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            TransactionEvent::StatusChanged {
                status: StatusKind::Query
            }
        ));

        let second = rx.recv().await.unwrap();
        assert!(matches!(second.event, TransactionEvent::Percentage { percentage: 10 }));
        assert_eq!(second.meta.level, EventLevel::Debug);

        let third = rx.recv().await.unwrap();
        match third.event {
            TransactionEvent::ErrorCode { kind, details } => {
                assert_eq!(kind, ErrorKind::TransactionCancelled);
                assert_eq!(details, "The thread was stopped successfully");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(third.meta.level, EventLevel::Warn);
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_finished(ExitStatus::Success, Duration::ZERO);
    }

    #[test]
    fn test_event_serialization() {
        let record =
            PackageRecord::from_parts(InfoKind::Installed, "glib2;2.14.0;i386;fedora", None)
                .unwrap();
        let json = serde_json::to_value(TransactionEvent::Package { record }).unwrap();
        assert_eq!(json["type"], "package");
        assert_eq!(json["record"]["package_id"], "glib2;2.14.0;i386;fedora");

        let json = serde_json::to_value(TransactionEvent::ErrorCode {
            kind: ErrorKind::NotSupported,
            details: "search-file".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "not-supported");
    }

    #[test]
    fn test_finished_log_levels() {
        let failed = TransactionEvent::Finished {
            exit: ExitStatus::Failed,
            runtime: Duration::ZERO,
        };
        assert_eq!(failed.log_level(), tracing::Level::ERROR);
        assert!(failed.is_finished());

        let ok = TransactionEvent::Finished {
            exit: ExitStatus::Success,
            runtime: Duration::ZERO,
        };
        assert_eq!(ok.log_level(), tracing::Level::INFO);
    }
}
