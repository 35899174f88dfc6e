//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::{event::DomainEvent, store::FlatFileStore};

/// How many unread events the broadcast channel buffers per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The flat-file store holding user accounts and transactions.
    pub store: Arc<Mutex<FlatFileStore>>,

    /// The monthly budget that all-time expenses are compared against.
    pub monthly_budget: f64,

    /// The channel that domain events are published on.
    events: broadcast::Sender<DomainEvent>,
}

impl AppState {
    /// Create a new [AppState] wrapping `store`.
    pub fn new(store: FlatFileStore, monthly_budget: f64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            store: Arc::new(Mutex::new(store)),
            monthly_budget,
            events,
        }
    }

    /// Subscribe to the domain events published by this server.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Publish a domain event to all subscribers.
    ///
    /// Events are fire-and-forget: publishing with no subscribers is not an
    /// error.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.events.send(event);
    }
}
