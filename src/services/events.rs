//! In-process publish/subscribe keyed by event name.
//!
//! Each event name gets its own broadcast channel, created on first
//! subscribe. Publishing to a name nobody listens to is a no-op: events are
//! never stored, so a subscriber only sees what is published after it
//! registered. A subscriber that falls more than `capacity` events behind
//! skips the ones it missed; publishers never wait.

use std::collections::HashMap;

use futures::Stream;
use futures::stream::select_all;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Published once per created movie, carrying the created movie
pub const MOVIE_ADDED: &str = "MOVIE_ADDED";

/// Default per-event-name buffer
pub const DEFAULT_CAPACITY: usize = 256;

pub struct EventBus<T> {
    channels: RwLock<HashMap<String, broadcast::Sender<T>>>,
    capacity: usize,
}

impl<T> EventBus<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, event_name: &str) -> broadcast::Sender<T> {
        if let Some(tx) = self.channels.read().get(event_name) {
            return tx.clone();
        }
        self.channels
            .write()
            .entry(event_name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Deliver `payload` to every current subscriber of `event_name`.
    /// Returns how many subscribers it reached.
    pub fn publish(&self, event_name: &str, payload: T) -> usize {
        let tx = self.channels.read().get(event_name).cloned();
        let delivered = tx.map(|tx| tx.send(payload).unwrap_or(0)).unwrap_or(0);
        tracing::debug!(event = event_name, delivered, "Published event");
        delivered
    }

    /// Lazy stream of payloads published to any of `event_names` from now on.
    /// Dropping the stream releases the registration.
    pub fn subscribe(&self, event_names: &[&str]) -> impl Stream<Item = T> + Send + use<T> {
        let streams: Vec<_> = event_names
            .iter()
            .map(|name| BroadcastStream::new(self.sender(name).subscribe()))
            .collect();

        select_all(streams).filter_map(|result| match result {
            Ok(payload) => Some(payload),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Subscriber lagged; events skipped");
                None
            }
        })
    }

    /// Number of live subscribers for `event_name`
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.channels
            .read()
            .get(event_name)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl<T> Default for EventBus<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next<S: Stream<Item = u32> + Unpin>(stream: &mut S) -> Option<u32> {
        tokio::time::timeout(Duration::from_millis(200), stream.next())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::<u32>::default();
        let mut a = Box::pin(bus.subscribe(&[MOVIE_ADDED]));
        let mut b = Box::pin(bus.subscribe(&[MOVIE_ADDED]));

        assert_eq!(bus.publish(MOVIE_ADDED, 7), 2);

        assert_eq!(next(&mut a).await, Some(7));
        assert_eq!(next(&mut b).await, Some(7));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::<u32>::default();
        assert_eq!(bus.publish(MOVIE_ADDED, 1), 0);

        let mut late = Box::pin(bus.subscribe(&[MOVIE_ADDED]));
        bus.publish(MOVIE_ADDED, 2);

        assert_eq!(next(&mut late).await, Some(2));
        assert_eq!(next(&mut late).await, None);
    }

    #[tokio::test]
    async fn test_publish_order_preserved_per_subscriber() {
        let bus = EventBus::<u32>::default();
        let mut sub = Box::pin(bus.subscribe(&[MOVIE_ADDED]));

        for i in 0..5 {
            bus.publish(MOVIE_ADDED, i);
        }

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(next(&mut sub).await.unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_event_names_are_isolated() {
        let bus = EventBus::<u32>::default();
        let mut added = Box::pin(bus.subscribe(&[MOVIE_ADDED]));

        bus.publish("SOMETHING_ELSE", 1);
        bus.publish(MOVIE_ADDED, 2);

        assert_eq!(next(&mut added).await, Some(2));
    }

    #[tokio::test]
    async fn test_subscribe_to_several_names() {
        let bus = EventBus::<u32>::default();
        let mut both = Box::pin(bus.subscribe(&["A", "B"]));

        bus.publish("A", 1);
        bus.publish("B", 2);

        let mut seen = vec![next(&mut both).await.unwrap(), next(&mut both).await.unwrap()];
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_registration() {
        let bus = EventBus::<u32>::default();
        let sub = bus.subscribe(&[MOVIE_ADDED]);
        assert_eq!(bus.subscriber_count(MOVIE_ADDED), 1);

        drop(sub);

        assert_eq!(bus.subscriber_count(MOVIE_ADDED), 0);
        assert_eq!(bus.publish(MOVIE_ADDED, 1), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_continues() {
        let bus = EventBus::<u32>::new(2);
        let mut slow = Box::pin(bus.subscribe(&[MOVIE_ADDED]));

        for i in 0..5 {
            bus.publish(MOVIE_ADDED, i);
        }

        // Oldest events were overwritten; the newest two survive
        assert_eq!(next(&mut slow).await, Some(3));
        assert_eq!(next(&mut slow).await, Some(4));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = EventBus::<u32>::default();
        let second = EventBus::<u32>::default();
        let _sub = first.subscribe(&[MOVIE_ADDED]);

        assert_eq!(first.subscriber_count(MOVIE_ADDED), 1);
        assert_eq!(second.subscriber_count(MOVIE_ADDED), 0);
    }
}
