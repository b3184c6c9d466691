//! # ocres state
//!
//! Client-side state machines that mirror remote resources.
//!
//! A [`Binding`] reads a resource, observes it and feeds everything it
//! receives through a [`StateReconciler`] into a [`StateMachine`]. The
//! reconciler drops notifications at or below the last applied sequence
//! number, so replays and reordering cannot move local state backwards.
//! Reconciled state leaves through a [`StateSink`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_state::prelude::*;
//! use std::sync::Arc;
//!
//! let client = Arc::new(ResourceClient::local(network, ClientConfig::default())?);
//! let player = client.discover(media_player::RESOURCE_TYPE).next().unwrap();
//!
//! let binding = Binding::bind(client, player, PlayerMachine::new(), Arc::new(NoopSink))?;
//! binding.play_pause()?;
//! assert_eq!(binding.state(), PlayerState::Playing);
//! ```
//!
//! ## Machines
//!
//! - [`PlayerMachine`]: Idle / Playing / Paused, named by the resource itself
//! - [`BrightnessMachine`]: a level in 0..=100

pub mod binding;
pub mod brightness;
pub mod logging;
pub mod player;
pub mod reconciler;
pub mod sink;

pub use binding::Binding;
pub use brightness::BrightnessMachine;
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use player::PlayerMachine;
pub use reconciler::{Reconciled, Rejection, StateMachine, StateReconciler};
pub use sink::{ChannelSink, NoopSink, SinkEvent, StateSink};

pub mod prelude {
    pub use crate::{
        Binding, BrightnessMachine, ChannelSink, NoopSink, PlayerMachine, Reconciled, SinkEvent,
        StateMachine, StateReconciler, StateSink,
    };
    pub use resource_client::{ClientConfig, ResourceClient};
    pub use resource_model::schema::{brightness, media_player};
    pub use resource_model::PlayerState;
}
