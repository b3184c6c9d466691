//! # ocres client
//!
//! Discovers remote resources by type, reads and updates them, and observes
//! their changes. All methods are synchronous; delivery and background work
//! happen on a bounded pool owned by the client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_client::{ClientConfig, LocalNetwork, ResourceClient};
//!
//! let network = LocalNetwork::new();
//! network.attach(platform);
//!
//! let client = ResourceClient::local(network, ClientConfig::responsive())?;
//! let lights: Vec<_> = client.discover("oic.r.light.brightness").collect();
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod local;
pub mod observation;
pub mod transport;

pub use client::ResourceClient;
pub use config::ClientConfig;
pub use discovery::DiscoveryIterator;
pub use local::{LocalNetwork, LocalTransport};
pub use observation::ObservationHandle;
pub use transport::Transport;
