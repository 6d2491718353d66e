//! Mutation signals and their observers.

use crate::error::RuntimeError;
use rackline_core::Entity;

/// Phase of a many-to-many relation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum M2MAction {
    PreAdd,
    PostAdd,
    PreRemove,
    PostRemove,
    PreClear,
    PostClear,
}

/// Emitted by the storage layer whenever an entity is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationSignal {
    /// The entity was written. `created` is true for the first write.
    PostSave { created: bool },
    /// One of the entity's many-to-many relations changed. `pk_set` holds the
    /// ids of the related objects that were added or removed.
    M2MChanged { action: M2MAction, pk_set: Vec<u64> },
    /// The entity is about to be deleted and is still readable.
    PreDelete,
}

impl MutationSignal {
    /// Whether the signal describes a change worth logging. Only completed
    /// adds and removes that touched at least one related object count.
    pub fn is_effective(&self) -> bool {
        match self {
            Self::M2MChanged { action, pk_set } => {
                matches!(action, M2MAction::PostAdd | M2MAction::PostRemove) && !pk_set.is_empty()
            }
            _ => true,
        }
    }
}

/// Receives mutation signals synchronously, in the order they are published.
pub trait MutationObserver {
    fn on_mutation(
        &mut self,
        entity: &dyn Entity,
        signal: &MutationSignal,
    ) -> Result<(), RuntimeError>;
}

impl<T: MutationObserver + ?Sized> MutationObserver for &mut T {
    fn on_mutation(
        &mut self,
        entity: &dyn Entity,
        signal: &MutationSignal,
    ) -> Result<(), RuntimeError> {
        (**self).on_mutation(entity, signal)
    }
}

/// Fans a signal out to every registered observer in registration order.
#[derive(Default)]
pub struct SignalBus<'a> {
    observers: Vec<Box<dyn MutationObserver + 'a>>,
}

impl<'a> SignalBus<'a> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: impl MutationObserver + 'a) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver a signal. Stops at the first observer that fails.
    pub fn publish(
        &mut self,
        entity: &dyn Entity,
        signal: &MutationSignal,
    ) -> Result<(), RuntimeError> {
        for observer in &mut self.observers {
            observer.on_mutation(entity, signal)?;
        }
        Ok(())
    }
}
