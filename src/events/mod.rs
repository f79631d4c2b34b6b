use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::services::payments::PaymentStatus;

/// Events published by the storefront flow.
///
/// `PincodeChanged` is the cross-view synchronization signal: listeners
/// update their own in-memory copy of the selection. No ordering guarantee
/// beyond last-write-wins on the resolved value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PincodeChanged {
        session_id: String,
        new_value: String,
        old_value: Option<String>,
    },
    CartUpdated {
        session_id: String,
    },
    PaymentInitiated {
        order_id: String,
    },
    PaymentStatusChanged {
        order_id: String,
        status: PaymentStatus,
    },
}

/// Publish/subscribe fan-out with a fallback channel.
///
/// The broadcast channel is the primary mechanism; when it cannot deliver
/// (no live subscribers), the event is routed to the mpsc fallback drained
/// by [`process_events`], so a change notification is never silently
/// dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    primary: broadcast::Sender<Event>,
    fallback: mpsc::Sender<Event>,
}

impl EventBus {
    /// Create the bus and the fallback receiver to hand to
    /// [`process_events`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (primary, _) = broadcast::channel(capacity);
        let (fallback, fallback_rx) = mpsc::channel(capacity);
        (Self { primary, fallback }, fallback_rx)
    }

    /// Subscribe to the primary broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.primary.subscribe()
    }

    /// Publish an event, falling back to the secondary channel when the
    /// broadcast has no receivers.
    pub async fn publish(&self, event: Event) -> Result<(), String> {
        match self.primary.send(event.clone()) {
            Ok(receivers) => {
                debug!(receivers, "event broadcast");
                Ok(())
            }
            Err(_) => self
                .fallback
                .send(event)
                .await
                .map_err(|e| format!("event fallback channel closed: {e}")),
        }
    }

    /// Publish, logging instead of propagating delivery failures. Event
    /// delivery is best-effort and must never fail a request.
    pub async fn publish_or_log(&self, event: Event) {
        if let Err(e) = self.publish(event).await {
            warn!("failed to publish event: {e}");
        }
    }
}

/// Drain the fallback channel. Runs for the lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("event fallback processor started");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PincodeChanged {
                session_id,
                new_value,
                old_value,
            } => {
                info!(
                    %session_id,
                    %new_value,
                    old_value = old_value.as_deref().unwrap_or(""),
                    "pincode changed"
                );
            }
            Event::CartUpdated { session_id } => {
                debug!(%session_id, "cart updated");
            }
            Event::PaymentInitiated { order_id } => {
                info!(%order_id, "payment initiated");
            }
            Event::PaymentStatusChanged { order_id, status } => {
                info!(%order_id, ?status, "payment status changed");
            }
        }
    }

    info!("event fallback processor stopped");
}
