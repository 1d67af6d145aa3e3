//! Event factory and per-organizer index.
//!
//! The registry is a thin collaborator: it constructs event contracts with
//! the shared environment, records them against their organizer in creation
//! order, and announces each creation on a broadcast channel for off-core
//! indexing. All the hard logic lives in [`EventContract`].

use crate::environment::Environment;
use crate::error::EventethError;
use crate::event::EventContract;
use crate::types::{AccountId, EventId, EventParams};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Shared handle to one event contract.
///
/// Each contract is a single logical actor: the mutex serializes all
/// mutating operations on the instance.
pub type EventHandle = Arc<Mutex<EventContract>>;

/// Notification emitted once per successful event creation.
#[derive(Clone, Debug)]
pub struct EventCreated {
    /// Handle of the new event
    pub event_id: EventId,
    /// Organizer it was recorded under
    pub organizer: AccountId,
    /// Descriptive event name
    pub name: String,
}

/// Creates event contracts and indexes them by organizer.
pub struct EventRegistry {
    env: Environment,
    events: HashMap<EventId, EventHandle>,
    by_organizer: HashMap<AccountId, Vec<EventId>>,
    notifications: broadcast::Sender<EventCreated>,
}

impl EventRegistry {
    /// Buffered creation notifications before lagging subscribers drop them
    const NOTIFICATION_BUFFER: usize = 64;

    /// Creates a registry that wires `env` into every contract it builds
    #[must_use]
    pub fn new(env: Environment) -> Self {
        let (notifications, _) = broadcast::channel(Self::NOTIFICATION_BUFFER);
        Self {
            env,
            events: HashMap::new(),
            by_organizer: HashMap::new(),
            notifications,
        }
    }

    /// Creates a new event contract and records it under its organizer.
    ///
    /// Emits an [`EventCreated`] notification; delivery is best-effort and
    /// having no subscriber is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EventethError::InvalidParams`] if the registration window
    /// is empty or inverted, or if the capacity is zero.
    pub fn create_event(&mut self, params: EventParams) -> Result<EventId, EventethError> {
        let organizer = params.organizer;
        let name = params.name.clone();
        let contract = EventContract::new(params, self.env.clone())?;

        let event_id = EventId::new();
        self.events.insert(event_id, Arc::new(Mutex::new(contract)));
        self.by_organizer.entry(organizer).or_default().push(event_id);

        let _ = self.notifications.send(EventCreated {
            event_id,
            organizer,
            name: name.clone(),
        });
        tracing::info!(event_id = %event_id, organizer = %organizer, name = %name, "event created");
        Ok(event_id)
    }

    /// Looks up the handle for an event
    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<EventHandle> {
        self.events.get(&event_id).cloned()
    }

    /// All events created by `organizer`, in creation order
    #[must_use]
    pub fn organizer_events(&self, organizer: AccountId) -> &[EventId] {
        self.by_organizer
            .get(&organizer)
            .map_or(&[], Vec::as_slice)
    }

    /// Subscribes to creation notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventCreated> {
        self.notifications.subscribe()
    }
}
