//! In-process network of platforms
//!
//! [`LocalNetwork`] stands in for the discovery and messaging layer when
//! every peer lives in one process: platforms attach under their host name
//! and [`LocalTransport`] routes requests to them. Request and response
//! payloads pass through the wire codec so both sides only ever share what
//! survives encoding.

use parking_lot::RwLock;
use resource_model::{
    codec, Observer, ObserverId, Representation, ResourceError, ResourceHandle, Result,
    SequenceNumber,
};
use resource_server::{Platform, Request};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::transport::Transport;

/// Platforms reachable from this process, keyed by host
#[derive(Default)]
pub struct LocalNetwork {
    hosts: RwLock<Vec<Arc<Platform>>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make a platform reachable; replaces any platform with the same host
    pub fn attach(&self, platform: Arc<Platform>) {
        let mut hosts = self.hosts.write();
        hosts.retain(|p| p.host() != platform.host());
        tracing::debug!("Attached host {}", platform.host());
        hosts.push(platform);
    }

    pub fn detach(&self, host: &str) -> Option<Arc<Platform>> {
        let mut hosts = self.hosts.write();
        let idx = hosts.iter().position(|p| p.host() == host)?;
        tracing::debug!("Detached host {}", host);
        Some(hosts.remove(idx))
    }

    pub fn platform(&self, host: &str) -> Option<Arc<Platform>> {
        self.hosts.read().iter().find(|p| p.host() == host).cloned()
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.read().iter().map(|p| p.host().to_string()).collect()
    }

    fn snapshot(&self) -> Vec<Arc<Platform>> {
        self.hosts.read().clone()
    }
}

/// [`Transport`] over a [`LocalNetwork`]
#[derive(Clone)]
pub struct LocalTransport {
    network: Arc<LocalNetwork>,
    request_timeout: Duration,
}

impl LocalTransport {
    pub fn new(network: Arc<LocalNetwork>, request_timeout: Duration) -> Self {
        Self {
            network,
            request_timeout,
        }
    }

    fn route(&self, host: &str) -> Result<Arc<Platform>> {
        match self.network.platform(host) {
            Some(platform) if platform.is_running() => Ok(platform),
            _ => Err(ResourceError::Transport(format!("host {} unreachable", host))),
        }
    }

    fn request(
        &self,
        resource: &ResourceHandle,
        request: Request,
    ) -> Result<(Option<Representation>, SequenceNumber)> {
        let platform = self.route(resource.host())?;
        platform
            .dispatch(resource.uri(), request)?
            .wait(self.request_timeout)?
            .into_result()
    }

    fn decode_reply(
        resource: &ResourceHandle,
        reply: (Option<Representation>, SequenceNumber),
    ) -> Result<(Representation, SequenceNumber)> {
        match reply {
            (Some(rep), sequence) => Ok((codec::round_trip(&rep)?, sequence)),
            (None, _) => Err(ResourceError::Internal(format!(
                "{} answered without a representation",
                resource.id
            ))),
        }
    }
}

impl Transport for LocalTransport {
    fn discover(&self, resource_type: &str, found: mpsc::Sender<ResourceHandle>) -> Result<()> {
        for platform in self.network.snapshot() {
            if !platform.is_running() {
                tracing::debug!("Skipping host {} during discovery: not running", platform.host());
                continue;
            }
            let handles = match platform.find(resource_type) {
                Ok(handles) => handles,
                Err(e) => {
                    tracing::warn!("Discovery on {} failed: {}", platform.host(), e);
                    continue;
                }
            };
            for handle in handles {
                if found.send(handle).is_err() {
                    tracing::debug!("Discovery consumer went away");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn read(&self, resource: &ResourceHandle) -> Result<(Representation, SequenceNumber)> {
        let reply = self.request(resource, Request::Read)?;
        Self::decode_reply(resource, reply)
    }

    fn update(
        &self,
        resource: &ResourceHandle,
        fragment: &Representation,
    ) -> Result<(Representation, SequenceNumber)> {
        let wire = codec::round_trip(fragment)?;
        let reply = self.request(resource, Request::update(wire))?;
        Self::decode_reply(resource, reply)
    }

    fn observe(&self, resource: &ResourceHandle, observer: Observer) -> Result<SequenceNumber> {
        let (_, sequence) = self.request(resource, Request::ObserverRegister(observer))?;
        Ok(sequence)
    }

    fn cancel(&self, resource: &ResourceHandle, observer: ObserverId) -> Result<()> {
        self.route(resource.host())?
            .cancel_observation(resource.uri(), observer)
    }
}
