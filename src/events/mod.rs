use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed by a single in-process
/// logging task; the channel decouples emitters from any future delivery
/// mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderPlaced {
        request_id: Uuid,
        user_id: i64,
    },
    PaymentSessionCreated {
        invoice_id: Uuid,
        preference_id: String,
    },
    InvoicePaid {
        invoice_id: Uuid,
    },
    PaymentFailed {
        invoice_id: Uuid,
        status: String,
    },
    BookCreated(i64),
    BookDeleted(i64),
    UserRegistered(i64),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; a full or closed channel is logged, never fatal.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "event channel closed, dropping event");
        }
    }
}

/// Creates a connected sender/receiver pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender
/// is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::InvoicePaid { invoice_id } => {
                info!(%invoice_id, "invoice paid");
            }
            Event::PaymentFailed { invoice_id, status } => {
                warn!(%invoice_id, %status, "payment failed");
            }
            other => {
                info!(event = ?other, "event processed");
            }
        }
    }
    info!("event channel drained, processor exiting");
}
