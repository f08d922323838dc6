//! Event Publisher

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::OutboundEvent;

/// Publishing side of the event bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: OutboundEvent);
}

/// Publisher that forwards events into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, event: OutboundEvent) {
        let kind = event.kind;
        if self.sender.send(event).is_err() {
            tracing::warn!(event = %kind, "Event bus closed, dropping event");
        } else {
            tracing::debug!(event = %kind, "Published");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutcomeKind;

    #[tokio::test]
    async fn test_publish_forwards_to_channel() {
        let (publisher, mut rx) = ChannelPublisher::new();

        publisher.publish(OutboundEvent::new(OutcomeKind::Connected)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, OutcomeKind::Connected);
    }

    #[tokio::test]
    async fn test_publish_after_close_does_not_panic() {
        let (publisher, rx) = ChannelPublisher::new();
        drop(rx);

        publisher.publish(OutboundEvent::new(OutcomeKind::Connected)).await;
    }
}
