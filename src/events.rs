use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::entities::stock_document::DocumentKind;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// The events this core can emit. Consumers (notification dispatch, outbox
// relays) live outside the crate and subscribe through the channel receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    DocumentPosted {
        kind: DocumentKind,
        document_id: Uuid,
        document_number: String,
        movement_count: usize,
    },
    DocumentVoided {
        kind: DocumentKind,
        document_id: Uuid,
        document_number: String,
    },
    ReorderAlertsRaised {
        warehouse_id: Option<Uuid>,
        alert_count: usize,
    },
    RequisitionSuggested {
        warehouse_id: Uuid,
        requisition_id: Uuid,
        line_count: usize,
    },
    /// Escape hatch for host applications that publish their own events
    /// through the same channel.
    Generic {
        message: String,
        metadata: serde_json::Value,
    },
}

/// Drains the event channel, logging each event. Host applications that need
/// richer delivery replace this loop with their own receiver.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
}

/// Builds a connected sender/receiver pair with the given channel capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}
