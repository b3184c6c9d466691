//! # ocres server
//!
//! Hosts resources on a platform, answers requests against them and pushes
//! every committed change to registered observers.
//!
//! ## Key Features
//!
//! - **Explicit platform context**: no process-wide singleton; create a
//!   [`Platform`] per host and shut it down when done
//! - **All-or-nothing updates**: handlers validate before they apply
//! - **Ordered fan-out**: one sequence number per committed change,
//!   delivered to each observer in order over bounded queues
//! - **Deferred reads**: slow handlers answer from a bounded worker pool
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_server::prelude::*;
//! use resource_model::schema::brightness;
//!
//! let platform = Platform::new(PlatformConfig::for_host("lamp"))?;
//! let handle = platform.register(
//!     "/a/brightness",
//!     brightness::RESOURCE_TYPE,
//!     &[BASELINE_INTERFACE],
//!     ResourceProperties::default(),
//!     BrightnessHandler::new(50, NullDevice::shared()),
//! )?;
//!
//! let reply = platform.dispatch("/a/brightness", Request::Read)?;
//! let response = reply.wait(std::time::Duration::from_secs(1))?;
//! ```
//!
//! ## Architecture
//!
//! 1. **Handlers** own state and validate fragments ([`ResourceHandler`])
//! 2. **Resources** wrap a handler with a lock and a sequence counter
//! 3. **The hub** keeps observer sets and fans out committed changes
//! 4. **The platform** routes requests by URI and owns the worker pool

pub mod config;
pub mod device;
pub mod handler;
pub mod handlers;
pub mod hub;
pub mod platform;
pub mod request;
pub mod resource;
pub mod worker;

pub use config::PlatformConfig;
pub use device::{AudioOutput, Backlight, DeviceError, NullDevice, PlayerDevice, SwitchOutput};
pub use handler::{ReadMode, ResourceHandler};
pub use handlers::{
    AudioControlHandler, BinarySwitchHandler, BrightnessHandler, MediaPlayerHandler, ResourceKind,
};
pub use hub::{NotificationHub, PublishReport};
pub use platform::{Platform, RegistrationHandle, RegistrationId};
pub use request::{
    DeferredResponse, HandlerReply, Request, RequestKind, Responder, Response, ResponseOutcome,
};
pub use resource::{Resource, ResourceProperties};
pub use worker::WorkerPool;

pub mod prelude {
    pub use crate::{
        AudioControlHandler, BinarySwitchHandler, BrightnessHandler, HandlerReply,
        MediaPlayerHandler, NullDevice, Platform, PlatformConfig, RegistrationHandle, Request,
        ResourceHandler, ResourceKind, ResourceProperties, Response, ResponseOutcome,
    };
    pub use resource_model::schema::BASELINE_INTERFACE;
}
