//! Sequenced application of remote state onto a local state machine
//!
//! The reconciler sits between a resource's notifications and a
//! [`StateMachine`]. Notifications carry sequence numbers: anything at or
//! below the last applied number is a duplicate and is dropped, and gaps are
//! fine (last write wins). Read and update responses that carry the
//! sequence number they reflect join the same order: one older than the
//! last applied notification is dropped. Responses without a sequence
//! number always apply.

use parking_lot::Mutex;
use resource_model::{Notification, Representation, SequenceNumber};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::sink::StateSink;

/// Why a representation's state could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("state received before the valid states are known")]
    StatesUnknown,

    #[error("state '{0}' is not one of the valid states")]
    UnknownState(String),

    #[error("state '{0}' has no local meaning")]
    UnmappedState(String),

    #[error("attribute '{0}' has an unexpected type")]
    WrongType(String),

    #[error("attribute '{name}' value {value} is out of range")]
    OutOfRange { name: String, value: i64 },
}

/// Result of offering a representation to a reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Applied { state_changed: bool },
    /// Superseded by an already applied sequence number
    Duplicate,
    Rejected(Rejection),
}

impl Reconciled {
    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciled::Applied { .. })
    }
}

/// A local finite state machine driven by remote representations
pub trait StateMachine: Send {
    type State: Copy + PartialEq + fmt::Debug + Send;

    fn current(&self) -> Self::State;

    /// Apply whatever the representation carries
    ///
    /// Must leave the state unchanged when it returns
    /// [`Reconciled::Rejected`]. Never returns [`Reconciled::Duplicate`].
    fn apply(&mut self, rep: &Representation, sink: &dyn StateSink<Self::State>) -> Reconciled;
}

struct Inner<M> {
    machine: M,
    last_sequence: Option<SequenceNumber>,
}

pub struct StateReconciler<M: StateMachine> {
    inner: Mutex<Inner<M>>,
    sink: Arc<dyn StateSink<M::State>>,
}

impl<M: StateMachine> StateReconciler<M> {
    pub fn new(machine: M, sink: Arc<dyn StateSink<M::State>>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                machine,
                last_sequence: None,
            }),
            sink,
        }
    }

    /// Apply a pushed notification unless it is stale
    pub fn apply_notification(&self, notification: &Notification) -> Reconciled {
        let mut inner = self.inner.lock();
        if let Some(last) = inner.last_sequence {
            if notification.sequence <= last {
                tracing::debug!(
                    "Dropping {} from {}: already at {}",
                    notification.sequence,
                    notification.resource,
                    last
                );
                return Reconciled::Duplicate;
            }
        }

        inner.last_sequence = Some(notification.sequence);
        let outcome = inner
            .machine
            .apply(&notification.representation, self.sink.as_ref());
        self.log_outcome(&outcome, &notification.resource.to_string());
        outcome
    }

    /// Apply a read or update response; never considered stale
    pub fn apply_response(&self, rep: &Representation) -> Reconciled {
        let mut inner = self.inner.lock();
        let outcome = inner.machine.apply(rep, self.sink.as_ref());
        self.log_outcome(&outcome, "response");
        outcome
    }

    /// Apply a read or update response that reflects `sequence`
    ///
    /// Dropped when a newer notification has already been applied. An
    /// applied response advances the last sequence number, so notifications
    /// it already covers are dropped in turn.
    pub fn apply_response_at(&self, rep: &Representation, sequence: SequenceNumber) -> Reconciled {
        let mut inner = self.inner.lock();
        if let Some(last) = inner.last_sequence {
            if sequence < last {
                tracing::debug!("Dropping response at {}: already at {}", sequence, last);
                return Reconciled::Duplicate;
            }
        }

        inner.last_sequence = Some(sequence);
        let outcome = inner.machine.apply(rep, self.sink.as_ref());
        self.log_outcome(&outcome, "response");
        outcome
    }

    fn log_outcome(&self, outcome: &Reconciled, origin: &str) {
        if let Reconciled::Rejected(rejection) = outcome {
            tracing::warn!("Ignoring state from {}: {}", origin, rejection);
        }
    }

    pub fn current(&self) -> M::State {
        self.inner.lock().machine.current()
    }

    pub fn last_sequence(&self) -> Option<SequenceNumber> {
        self.inner.lock().last_sequence
    }

    /// Inspect the machine under the reconciler's lock
    pub fn with_machine<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.inner.lock().machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NoopSink;
    use resource_model::ResourceId;

    /// Machine that stores the last `value` integer
    struct Counter(i64);

    impl StateMachine for Counter {
        type State = i64;

        fn current(&self) -> i64 {
            self.0
        }

        fn apply(&mut self, rep: &Representation, _sink: &dyn StateSink<i64>) -> Reconciled {
            match rep.get_int("value") {
                Ok(Some(v)) => {
                    let changed = v != self.0;
                    self.0 = v;
                    Reconciled::Applied { state_changed: changed }
                }
                Ok(None) => Reconciled::Applied { state_changed: false },
                Err(_) => Reconciled::Rejected(Rejection::WrongType("value".to_string())),
            }
        }
    }

    fn notification(seq: u64, value: i64) -> Notification {
        Notification {
            resource: ResourceId::new("host", "/counter"),
            sequence: SequenceNumber::new(seq),
            representation: Representation::new().with("value", value),
        }
    }

    fn reconciler() -> StateReconciler<Counter> {
        StateReconciler::new(Counter(0), Arc::new(NoopSink))
    }

    #[test]
    fn test_stale_notification_is_duplicate() {
        let r = reconciler();
        assert!(r.apply_notification(&notification(2, 20)).is_applied());
        assert_eq!(r.apply_notification(&notification(1, 10)), Reconciled::Duplicate);
        assert_eq!(r.apply_notification(&notification(2, 30)), Reconciled::Duplicate);
        assert_eq!(r.current(), 20);
    }

    #[test]
    fn test_gaps_apply_latest() {
        let r = reconciler();
        r.apply_notification(&notification(0, 1));
        r.apply_notification(&notification(5, 5));
        assert_eq!(r.current(), 5);
        assert_eq!(r.last_sequence(), Some(SequenceNumber::new(5)));
    }

    #[test]
    fn test_response_applies_without_sequence() {
        let r = reconciler();
        r.apply_notification(&notification(3, 3));

        let outcome = r.apply_response(&Representation::new().with("value", 9));

        assert_eq!(outcome, Reconciled::Applied { state_changed: true });
        assert_eq!(r.current(), 9);
        assert_eq!(r.last_sequence(), Some(SequenceNumber::new(3)));
    }

    #[test]
    fn test_response_older_than_notification_is_dropped() {
        let r = reconciler();
        assert!(r.apply_notification(&notification(2, 20)).is_applied());

        let outcome = r.apply_response_at(
            &Representation::new().with("value", 10),
            SequenceNumber::new(1),
        );

        assert_eq!(outcome, Reconciled::Duplicate);
        assert_eq!(r.current(), 20);
        assert_eq!(r.last_sequence(), Some(SequenceNumber::new(2)));
    }

    #[test]
    fn test_response_at_last_sequence_applies() {
        let r = reconciler();
        r.apply_notification(&notification(2, 20));

        let outcome = r.apply_response_at(
            &Representation::new().with("value", 20),
            SequenceNumber::new(2),
        );

        assert_eq!(outcome, Reconciled::Applied { state_changed: false });
        assert_eq!(r.last_sequence(), Some(SequenceNumber::new(2)));
    }

    #[test]
    fn test_newer_response_supersedes_covered_notifications() {
        let r = reconciler();
        r.apply_notification(&notification(1, 1));

        let outcome = r.apply_response_at(
            &Representation::new().with("value", 4),
            SequenceNumber::new(4),
        );

        assert_eq!(outcome, Reconciled::Applied { state_changed: true });
        assert_eq!(r.last_sequence(), Some(SequenceNumber::new(4)));
        assert_eq!(r.apply_notification(&notification(3, 3)), Reconciled::Duplicate);
        assert_eq!(r.current(), 4);
        assert!(r.apply_notification(&notification(5, 5)).is_applied());
    }

    #[test]
    fn test_first_notification_at_zero_applies() {
        let r = reconciler();
        assert!(r.apply_notification(&notification(0, 4)).is_applied());
        assert_eq!(r.current(), 4);
    }
}
