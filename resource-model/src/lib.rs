//! # ocres model
//!
//! Types shared by every ocres peer: the [`Representation`] attribute bag,
//! resource and observer identities, sequence numbers, the notification
//! queues used for observation, and the common [`ResourceError`].
//!
//! ## Example
//!
//! ```rust
//! use resource_model::{codec, Representation};
//!
//! let rep = Representation::new()
//!     .with("state", "Idle")
//!     .with("mediaStates", vec!["Idle".to_string(), "Playing".to_string()]);
//!
//! let bytes = codec::encode(&rep).unwrap();
//! assert_eq!(codec::decode(&bytes).unwrap(), rep);
//! ```

pub mod codec;
pub mod error;
pub mod ids;
pub mod notification;
pub mod representation;
pub mod schema;
pub mod value;

pub use error::{ErrorKind, ResourceError, Result};
pub use ids::{ObserverId, ResourceHandle, ResourceId, SequenceNumber};
pub use notification::{
    observer_channel, DeliveryFailure, Notification, NotificationReceiver, Observer, ObserverSink,
};
pub use representation::Representation;
pub use schema::PlayerState;
pub use value::Value;

/// Convenient imports for resource implementations and clients
pub mod prelude {
    pub use crate::{
        Notification, ObserverId, Representation, ResourceError, ResourceHandle, ResourceId,
        Result, SequenceNumber, Value, PlayerState,
    };
}
