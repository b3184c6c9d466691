//! Pushed state changes and the bounded queues that carry them
//!
//! Every observer owns one bounded queue. The publishing side only ever uses
//! non-blocking sends, so a slow observer loses pushes instead of stalling the
//! resource that publishes them.

use tokio::sync::mpsc;

use crate::ids::{ObserverId, ResourceId, SequenceNumber};
use crate::representation::Representation;

/// One pushed state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub resource: ResourceId,
    pub sequence: SequenceNumber,
    pub representation: Representation,
}

/// Why a push could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The observer's queue is full; this push is lost
    Full,
    /// The observer went away
    Closed,
}

/// Sending half of an observer queue
#[derive(Debug, Clone)]
pub struct ObserverSink {
    tx: mpsc::Sender<Notification>,
}

impl ObserverSink {
    pub fn try_deliver(&self, notification: Notification) -> Result<(), DeliveryFailure> {
        self.tx.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryFailure::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of an observer queue
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: mpsc::Receiver<Notification>,
}

impl NotificationReceiver {
    /// Wait for the next push; `None` once every sink is gone
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Blocking variant for callers outside an async context
    pub fn blocking_recv(&mut self) -> Option<Notification> {
        self.rx.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a bounded observer queue holding at most `depth` pending pushes
pub fn observer_channel(depth: usize) -> (ObserverSink, NotificationReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (ObserverSink { tx }, NotificationReceiver { rx })
}

/// An observer as registered with a resource
#[derive(Debug, Clone)]
pub struct Observer {
    pub id: ObserverId,
    pub sink: ObserverSink,
}

impl Observer {
    pub fn new(sink: ObserverSink) -> Self {
        Self {
            id: ObserverId::new(),
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(seq: u64) -> Notification {
        Notification {
            resource: ResourceId::new("host", "/a/b"),
            sequence: SequenceNumber::new(seq),
            representation: Representation::new().with("value", true),
        }
    }

    #[test]
    fn test_full_queue_reports_full() {
        let (sink, mut rx) = observer_channel(1);
        assert!(sink.try_deliver(notification(0)).is_ok());
        assert_eq!(sink.try_deliver(notification(1)), Err(DeliveryFailure::Full));

        assert_eq!(rx.try_recv().map(|n| n.sequence.as_u64()), Some(0));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_dropped_receiver_reports_closed() {
        let (sink, rx) = observer_channel(4);
        drop(rx);
        assert!(sink.is_closed());
        assert_eq!(sink.try_deliver(notification(0)), Err(DeliveryFailure::Closed));
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        let (sink, _rx) = observer_channel(0);
        assert!(sink.try_deliver(notification(0)).is_ok());
    }
}
