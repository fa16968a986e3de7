use std::sync::Arc;

use tokio::sync::mpsc;

use super::{JournalEnvelope, JournalHandle, JournalRecord, JournalStore};

/// Background task that receives journal events and appends them to storage
pub struct JournalWriter {
    rx: mpsc::Receiver<JournalEnvelope>,
    store: Arc<dyn JournalStore>,
}

impl JournalWriter {
    pub fn new(rx: mpsc::Receiver<JournalEnvelope>, store: Arc<dyn JournalStore>) -> Self {
        Self { rx, store }
    }

    /// Run the writer, consuming events until the channel is closed
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("Journal writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = JournalRecord {
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                event: envelope.event,
            };
            self.store.append(record);
        }

        tracing::info!("Journal writer shutting down");
    }
}

/// Create a complete journal system
///
/// Returns:
/// - `JournalHandle` - for emitting events (clone this to share across tasks)
/// - `JournalWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
pub fn create_journal(
    store: Arc<dyn JournalStore>,
    buffer_size: usize,
) -> (JournalHandle, JournalWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = JournalHandle::new(tx);
    let writer = JournalWriter::new(rx, store);
    (handle, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JournalEvent, MemoryJournalStore};

    #[tokio::test]
    async fn test_writer_receives_and_stores_events() {
        let store = Arc::new(MemoryJournalStore::new(10));
        let store_dyn: Arc<dyn JournalStore> = Arc::clone(&store) as Arc<dyn JournalStore>;
        let (handle, writer) = create_journal(store_dyn, 10);

        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(JournalEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            })
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        let records = store.recent(10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "service_started");
    }

    #[tokio::test]
    async fn test_cloned_handles_share_writer() {
        let store = Arc::new(MemoryJournalStore::new(10));
        let store_dyn: Arc<dyn JournalStore> = Arc::clone(&store) as Arc<dyn JournalStore>;
        let (handle1, writer) = create_journal(store_dyn, 10);
        let handle2 = handle1.clone();

        let writer_handle = tokio::spawn(writer.run());

        handle1
            .emit(JournalEvent::RunStarted {
                run_id: "r-1".to_string(),
                quota: 2,
                dry_run: false,
            })
            .await;
        handle2
            .emit(JournalEvent::RunCompleted {
                run_id: "r-1".to_string(),
                posted: 2,
                duration_ms: 10,
            })
            .await;

        drop(handle1);
        drop(handle2);
        writer_handle.await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_events_emitted_just_before_drop_are_captured() {
        let store = Arc::new(MemoryJournalStore::new(100));
        let store_dyn: Arc<dyn JournalStore> = Arc::clone(&store) as Arc<dyn JournalStore>;
        let (handle, writer) = create_journal(store_dyn, 100);

        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(JournalEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;
        drop(handle);

        writer_handle.await.unwrap();

        let records = store.recent(10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "service_stopped");
    }
}
