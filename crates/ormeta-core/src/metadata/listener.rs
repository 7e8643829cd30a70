//! Entity listener metadata.

use super::graph::{EmbeddedKey, EntityKey};
use crate::registry::{EntityListenerArgs, ListenerEvent, Target};

/// A lifecycle callback declared on an entity or embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityListenerMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Embedded the listener was declared in.
    pub embedded: Option<EmbeddedKey>,
    /// Declaring target.
    pub target: Target,
    /// Method invoked.
    pub property_name: String,
    /// Event listened to.
    pub event: ListenerEvent,
}

impl EntityListenerMetadata {
    pub(crate) fn from_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &EntityListenerArgs) -> Self {
        Self {
            entity,
            embedded,
            target: args.target.clone(),
            property_name: args.property_name.clone(),
            event: args.event,
        }
    }

    /// Check if this listener handles the event.
    pub fn handles(&self, event: ListenerEvent) -> bool {
        self.event == event
    }
}
