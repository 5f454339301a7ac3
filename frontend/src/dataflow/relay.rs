//! Fan-out event relay built on unbounded channels.
//!
//! Every subscriber gets its own receiver. Dropping a receiver unsubscribes
//! it; the sender notices on the next send and forgets it.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use std::sync::{Arc, Mutex, PoisonError};

/// Type-safe event relay.
///
/// ```rust,ignore
/// let (sheet_clicked_relay, mut clicked_stream) = relay::<String>();
/// let mut status_stream = sheet_clicked_relay.subscribe();
///
/// sheet_clicked_relay.send("CLK1".to_string());
/// assert_eq!(clicked_stream.next().await.as_deref(), Some("CLK1"));
/// assert_eq!(status_stream.next().await.as_deref(), Some("CLK1"));
/// ```
#[derive(Clone, Debug)]
pub struct Relay<T = ()>
where
    T: Clone + Send + Sync + 'static,
{
    subscribers: Arc<Mutex<Vec<UnboundedSender<T>>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Every receiver has been dropped.
    NoSubscribers,
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Relay with one subscriber already attached.
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let relay = Relay {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        };
        let receiver = relay.subscribe();
        (relay, receiver)
    }

    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (sender, receiver) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers to every live subscriber. Events sent with no subscriber
    /// are dropped.
    pub fn send(&self, value: T) {
        let _ = self.deliver(value);
    }

    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        match self.deliver(value) {
            0 => Err(RelayError::NoSubscribers),
            _ => Ok(()),
        }
    }

    fn deliver(&self, value: T) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.unbounded_send(value.clone()).is_ok());
        subscribers.len()
    }
}

impl<T> Default for Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Disconnected relay; events are discarded until someone subscribes.
    fn default() -> Self {
        Relay {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Relay::new()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn delivers_to_first_subscriber() {
        let (relay, mut receiver) = Relay::new();
        relay.send("hovered".to_string());
        assert_eq!(receiver.next().await, Some("hovered".to_string()));
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let (clicked_relay, mut session_stream) = relay::<u32>();
        let mut status_stream = clicked_relay.subscribe();
        assert_eq!(clicked_relay.subscriber_count(), 2);

        clicked_relay.send(1);
        clicked_relay.send(2);

        assert_eq!(session_stream.next().await, Some(1));
        assert_eq!(session_stream.next().await, Some(2));
        assert_eq!(status_stream.next().await, Some(1));
        assert_eq!(status_stream.next().await, Some(2));
    }

    #[tokio::test]
    async fn dropped_receiver_unsubscribes() {
        let (relay, receiver) = relay::<u8>();
        let mut kept = relay.subscribe();
        drop(receiver);

        assert!(relay.try_send(7).is_ok());
        assert_eq!(relay.subscriber_count(), 1);
        assert_eq!(kept.next().await, Some(7));

        drop(kept);
        assert_eq!(relay.try_send(8), Err(RelayError::NoSubscribers));
        assert_eq!(relay.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn default_relay_accepts_late_subscribers() {
        let relay = Relay::<()>::default();
        relay.send(());
        let mut receiver = relay.subscribe();
        relay.send(());
        assert_eq!(receiver.next().await, Some(()));
    }
}
