use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Which list an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Bookings,
    Gallery,
    Session,
}

impl Topic {
    pub fn of(event: &Event) -> Self {
        match event {
            Event::BookingCreated(_) | Event::BookingUpdated(_) | Event::BookingDeleted { .. } => {
                Topic::Bookings
            }
            Event::ImageAdded(_) | Event::ImageDeleted { .. } => Topic::Gallery,
            Event::AdminLoggedIn | Event::AdminLoggedOut => Topic::Session,
        }
    }
}

/// Broadcast hub for committed events, one channel per topic.
pub struct NotifyHub {
    channels: DashMap<Topic, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a topic. Creates the channel if needed.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send to the event's topic. No-op if nobody is listening.
    pub fn send(&self, event: &Event) {
        if let Some(sender) = self.channels.get(&Topic::of(event)) {
            let _ = sender.send(event.clone());
        }
    }
}

/// Next event for a long-lived listener. A lagging receiver skips the
/// dropped events and keeps going; `None` once the hub is gone.
pub async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Option<Event> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(n)) => warn!("subscriber lagged, skipped {n} events"),
            Err(RecvError::Closed) => return None,
        }
    }
}
