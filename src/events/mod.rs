use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted after each successful transfer mutation.
///
/// Today the only consumer is the logging task below; user-facing
/// notification delivery is intentionally out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    TransferRequested {
        order_id: Uuid,
        tenant_id: Uuid,
        requester_id: Uuid,
        sender_location_id: Uuid,
        item_code: String,
    },
    TransferAccepted {
        order_id: Uuid,
    },
    TransferRejected {
        order_id: Uuid,
    },
    TransferShipped {
        order_id: Uuid,
        shipment_ref: String,
    },
    TransferReceived {
        order_id: Uuid,
    },
    TransferCancelled {
        order_id: Uuid,
    },
}

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

/// Drains the event channel, logging each event. Spawned once at startup;
/// exits when every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::TransferRequested {
                order_id,
                requester_id,
                sender_location_id,
                item_code,
                ..
            } => info!(
                %order_id, %requester_id, %sender_location_id, %item_code,
                "transfer requested"
            ),
            Event::TransferAccepted { order_id } => info!(%order_id, "transfer accepted"),
            Event::TransferRejected { order_id } => info!(%order_id, "transfer rejected"),
            Event::TransferShipped {
                order_id,
                shipment_ref,
            } => info!(%order_id, %shipment_ref, "transfer shipped"),
            Event::TransferReceived { order_id } => info!(%order_id, "transfer received"),
            Event::TransferCancelled { order_id } => info!(%order_id, "transfer cancelled"),
        }
    }
}
