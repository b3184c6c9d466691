//! Observer registry and notification fan-out
//!
//! The hub keeps one observer set per resource. Resources call
//! [`NotificationHub::publish`] while holding their own write lock, so every
//! observer sees sequence numbers in order; the hub itself only ever uses
//! non-blocking sends.
//!
//! ## Delivery rules
//!
//! - A new observer receives the current representation before anything else,
//!   or is not registered at all
//! - Each push goes to observers in registration order
//! - A full observer queue loses that push (the next sequence supersedes it)
//! - A closed observer queue removes the observer
//! - Closing a resource removes every observer; later subscribes fail

use dashmap::DashMap;
use parking_lot::Mutex;
use resource_model::{
    DeliveryFailure, Notification, Observer, ObserverId, Representation, ResourceError,
    ResourceId, Result, SequenceNumber,
};
use std::sync::Arc;

/// Counts from one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub removed: usize,
}

struct ObserverEntry {
    observer: Observer,
    last_delivered: Mutex<Option<SequenceNumber>>,
}

impl ObserverEntry {
    /// Claim `sequence` for delivery; false when it is not newer than the last one
    fn claim(&self, sequence: SequenceNumber) -> bool {
        let mut last = self.last_delivered.lock();
        match *last {
            Some(prev) if sequence <= prev => false,
            _ => {
                *last = Some(sequence);
                true
            }
        }
    }
}

#[derive(Default)]
struct ObserverSet {
    observers: Vec<Arc<ObserverEntry>>,
    closed: bool,
}

/// Per-resource observer sets with explicit fan-out
#[derive(Default)]
pub struct NotificationHub {
    sets: DashMap<ResourceId, Arc<Mutex<ObserverSet>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting observers for a resource
    pub fn open(&self, resource: &ResourceId) {
        self.sets
            .insert(resource.clone(), Arc::new(Mutex::new(ObserverSet::default())));
    }

    fn set(&self, resource: &ResourceId) -> Option<Arc<Mutex<ObserverSet>>> {
        self.sets.get(resource).map(|entry| entry.value().clone())
    }

    /// Register an observer and queue the current state for it
    ///
    /// Returns the sequence number of the initial delivery. An observer whose
    /// queue cannot take the initial state is not registered.
    pub fn subscribe(
        &self,
        resource: &ResourceId,
        observer: Observer,
        sequence: SequenceNumber,
        representation: Representation,
    ) -> Result<SequenceNumber> {
        let set = self
            .set(resource)
            .ok_or_else(|| ResourceError::NotFound(format!("resource {} is not observable", resource)))?;
        let mut set = set.lock();
        if set.closed {
            return Err(ResourceError::NotFound(format!("resource {} was destroyed", resource)));
        }

        let entry = Arc::new(ObserverEntry {
            observer,
            last_delivered: Mutex::new(None),
        });
        entry.claim(sequence);

        let initial = Notification {
            resource: resource.clone(),
            sequence,
            representation,
        };
        match entry.observer.sink.try_deliver(initial) {
            Ok(()) => {}
            Err(DeliveryFailure::Closed) => {
                return Err(ResourceError::Transport(format!(
                    "observer {} closed before registration",
                    entry.observer.id
                )));
            }
            Err(DeliveryFailure::Full) => {
                tracing::warn!(
                    "Refusing observer {} on {}: no room for the initial state",
                    entry.observer.id,
                    resource
                );
                return Err(ResourceError::Transport(format!(
                    "observer {} queue full before registration",
                    entry.observer.id
                )));
            }
        }

        tracing::debug!("Observer {} subscribed to {} at {}", entry.observer.id, resource, sequence);
        set.observers.push(entry);
        Ok(sequence)
    }

    /// Remove one observer
    pub fn unsubscribe(&self, resource: &ResourceId, observer: ObserverId) -> Result<()> {
        let set = self
            .set(resource)
            .ok_or_else(|| ResourceError::NotFound(format!("resource {} not found", resource)))?;
        let mut set = set.lock();
        let before = set.observers.len();
        set.observers.retain(|entry| entry.observer.id != observer);
        if set.observers.len() == before {
            return Err(ResourceError::NotFound(format!(
                "observer {} not registered on {}",
                observer, resource
            )));
        }
        tracing::debug!("Observer {} unsubscribed from {}", observer, resource);
        Ok(())
    }

    /// Push a committed state change to every observer
    pub fn publish(
        &self,
        resource: &ResourceId,
        sequence: SequenceNumber,
        representation: &Representation,
    ) -> PublishReport {
        let mut report = PublishReport::default();
        let Some(set) = self.set(resource) else {
            return report;
        };

        let snapshot = {
            let set = set.lock();
            if set.closed {
                return report;
            }
            set.observers.clone()
        };

        let mut failed = Vec::new();
        for entry in snapshot {
            if !entry.claim(sequence) {
                continue;
            }
            let notification = Notification {
                resource: resource.clone(),
                sequence,
                representation: representation.clone(),
            };
            match entry.observer.sink.try_deliver(notification) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryFailure::Full) => {
                    tracing::warn!(
                        "Dropped {} for observer {} on {}: queue full",
                        sequence,
                        entry.observer.id,
                        resource
                    );
                    report.dropped += 1;
                }
                Err(DeliveryFailure::Closed) => failed.push(entry.observer.id),
            }
        }

        if !failed.is_empty() {
            let mut set = set.lock();
            set.observers.retain(|entry| !failed.contains(&entry.observer.id));
            report.removed = failed.len();
            tracing::debug!("Removed {} closed observers from {}", failed.len(), resource);
        }

        report
    }

    /// Tear down a resource's observer set; returns how many observers it had
    pub fn close(&self, resource: &ResourceId) -> usize {
        match self.sets.remove(resource) {
            Some((_, set)) => {
                let mut set = set.lock();
                set.closed = true;
                let count = set.observers.len();
                set.observers.clear();
                count
            }
            None => 0,
        }
    }

    pub fn observer_count(&self, resource: &ResourceId) -> usize {
        self.set(resource)
            .map(|set| set.lock().observers.len())
            .unwrap_or(0)
    }
}
