use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::JournalEvent;

/// Envelope wrapping a journal event with its emission time
#[derive(Debug, Clone)]
pub struct JournalEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: JournalEvent,
}

/// Handle for emitting journal events
///
/// This is cheaply cloneable and can be shared across tasks.
/// Events are sent through an async channel to be written by the JournalWriter.
#[derive(Clone)]
pub struct JournalHandle {
    tx: mpsc::Sender<JournalEnvelope>,
}

impl JournalHandle {
    /// Create a new journal handle from a channel sender
    pub fn new(tx: mpsc::Sender<JournalEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit a journal event asynchronously
    ///
    /// If the channel is full or closed, the error is logged but the caller
    /// is not blocked or failed.
    pub async fn emit(&self, event: JournalEvent) {
        let envelope = JournalEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit journal event: {}", e);
        }
    }

    /// Try to emit a journal event without blocking
    ///
    /// Returns true if the event was sent successfully, false otherwise.
    pub fn try_emit(&self, event: JournalEvent) -> bool {
        let envelope = JournalEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit journal event: {}", e);
                false
            }
        }
    }
}
