//! Event system for collaborators.
//!
//! Every inbound notification and every completed command is published
//! here, so a UI or logger can observe the session without taking part in
//! request/response correlation.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::protocol::{CommandKind, StatusCode};

/// Event types that can be dispatched.
#[derive(Debug, Clone)]
pub enum Event {
    /// Session connected and notifications armed.
    Connected,
    /// Session closed.
    Disconnected,
    /// Raw frame received on the result channel.
    Notification { data: Bytes },
    /// A command's response was decoded.
    Completed {
        kind: CommandKind,
        status: StatusCode,
    },
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("subscription lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // No receivers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to all future events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe();

        dispatcher.dispatch(Event::Connected);

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert!(matches!(event, Some(Event::Connected)));
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers() {
        let dispatcher = EventDispatcher::default();
        dispatcher.dispatch(Event::Disconnected);

        let mut sub = dispatcher.subscribe();
        dispatcher.dispatch(Event::Completed {
            kind: CommandKind::Press,
            status: StatusCode::Ok,
        });
        assert!(matches!(
            sub.recv().await,
            Some(Event::Completed {
                kind: CommandKind::Press,
                status: StatusCode::Ok
            })
        ));
    }

    #[tokio::test]
    async fn test_subscription_closed() {
        let dispatcher = EventDispatcher::new(4);
        let mut sub = dispatcher.subscribe();
        drop(dispatcher);
        assert!(sub.recv().await.is_none());
    }
}
