use std::sync::{Arc, RwLock};

use praefectus_game::models::poll::VillagePoll;

#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A village was polled; carries everything read from that response.
    VillageSnapshotUpdated(Arc<VillagePoll>),
}

impl GameEvent {
    pub fn village_id(&self) -> u32 {
        match self {
            GameEvent::VillageSnapshotUpdated(poll) => poll.village_id(),
        }
    }
}

type Subscriber = Box<dyn Fn(&GameEvent) + Send + Sync>;

/// In-process publish/subscribe.
///
/// Publishing calls every subscriber right away, in registration order, on
/// the publisher's own call stack. Subscribers live as long as the channel;
/// there is no unsubscribe. A subscriber must not subscribe from inside its
/// own callback.
#[derive(Default)]
pub struct EventChannel {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(callback));
    }

    pub fn publish(&self, event: &GameEvent) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
