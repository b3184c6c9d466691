//! Where reconciled state goes
//!
//! A [`StateSink`] is the boundary to whatever renders or acts on local
//! state (a UI, a physical output). Sinks are called while the reconciler
//! holds its lock, so calls for one reconciler never interleave.

use resource_model::Value;
use std::sync::mpsc;

pub trait StateSink<S>: Send + Sync {
    /// A valid state was applied; `title` is set while something is playing
    fn on_state_applied(&self, state: S, title: Option<&str>);

    /// An auxiliary attribute changed
    fn on_attribute_applied(&self, _name: &str, _value: &Value) {}
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl<S> StateSink<S> for NoopSink {
    fn on_state_applied(&self, _state: S, _title: Option<&str>) {}
}

/// What a [`ChannelSink`] forwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent<S> {
    State { state: S, title: Option<String> },
    Attribute { name: String, value: Value },
}

/// Sink that forwards every call as a [`SinkEvent`] over a channel
///
/// # Example
///
/// ```rust
/// use resource_state::{ChannelSink, SinkEvent, StateSink};
///
/// let (sink, events) = ChannelSink::<i64>::new();
/// sink.on_state_applied(40, None);
///
/// assert_eq!(events.recv().unwrap(), SinkEvent::State { state: 40, title: None });
/// ```
pub struct ChannelSink<S> {
    tx: parking_lot::Mutex<mpsc::Sender<SinkEvent<S>>>,
}

impl<S> ChannelSink<S> {
    pub fn new() -> (Self, mpsc::Receiver<SinkEvent<S>>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx: parking_lot::Mutex::new(tx),
            },
            rx,
        )
    }

    fn forward(&self, event: SinkEvent<S>) {
        if self.tx.lock().send(event).is_err() {
            tracing::trace!("Sink receiver dropped");
        }
    }
}

impl<S: Send> StateSink<S> for ChannelSink<S> {
    fn on_state_applied(&self, state: S, title: Option<&str>) {
        self.forward(SinkEvent::State {
            state,
            title: title.map(str::to_string),
        });
    }

    fn on_attribute_applied(&self, name: &str, value: &Value) {
        self.forward(SinkEvent::Attribute {
            name: name.to_string(),
            value: value.clone(),
        });
    }
}
