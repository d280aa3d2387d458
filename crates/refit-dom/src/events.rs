//! Subscribe/publish bus for host-document events.
//!
//! The host never sends an explicit change feed; backends observe subtree
//! mutations opportunistically and publish them here as batches. Forwarded
//! clicks on engine-owned controls ride the same bus. The element waiter and
//! each icon-sync observer are independent subscribers of this one
//! abstraction; dropping a subscription unsubscribes it.

use tokio::sync::broadcast;

use crate::document::NodeId;

/// What changed about a node, in MutationObserver terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

/// One observed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
    pub kind: MutationKind,
}

/// An event published by a document backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A batch of subtree mutations. An empty batch is a resync hint:
    /// "something changed, re-query" — consumers must not assume batches
    /// enumerate every change.
    Mutations(Vec<Mutation>),
    /// A user click forwarded from an engine-owned control.
    Click(NodeId),
}

/// The bus a backend publishes document events on.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DocumentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event. A bus with no live subscribers drops the event,
    /// which is fine: nobody was waiting.
    pub fn publish(&self, event: DocumentEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscriptions (used by tests to verify unsubscribe).
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct EventSubscription {
    receiver: broadcast::Receiver<DocumentEvent>,
}

impl EventSubscription {
    /// Wait for the next event. A lagged receiver degrades to an empty
    /// mutation batch so consumers re-query instead of missing changes.
    /// Returns `None` once the backend is gone.
    pub async fn next(&mut self) -> Option<DocumentEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => {
                Some(DocumentEvent::Mutations(Vec::new()))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();
        bus.publish(DocumentEvent::Click(NodeId(4)));
        assert_eq!(sub.next().await, Some(DocumentEvent::Click(NodeId(4))));
    }

    #[tokio::test]
    async fn drop_unsubscribes() {
        let bus = EventBus::default();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagged_receiver_degrades_to_resync_hint() {
        let bus = EventBus::new(1);
        let mut sub = bus.subscribe();
        bus.publish(DocumentEvent::Click(NodeId(1)));
        bus.publish(DocumentEvent::Click(NodeId(2)));
        // The first recv observes the overflow and resyncs.
        assert_eq!(sub.next().await, Some(DocumentEvent::Mutations(Vec::new())));
        assert_eq!(sub.next().await, Some(DocumentEvent::Click(NodeId(2))));
    }
}
