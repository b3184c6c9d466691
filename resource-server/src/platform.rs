//! Explicit platform context hosting resources for one host
//!
//! A [`Platform`] owns the resource table, the notification hub and the
//! worker pool. Hosts create one with [`Platform::new`], register handlers,
//! route requests through [`Platform::dispatch`], and tear everything down
//! with [`Platform::shutdown`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use resource_model::{
    ObserverId, Representation, ResourceError, ResourceHandle, ResourceId, Result, SequenceNumber,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::PlatformConfig;
use crate::handler::ResourceHandler;
use crate::handlers::ResourceKind;
use crate::hub::NotificationHub;
use crate::request::{HandlerReply, Request};
use crate::resource::{Resource, ResourceProperties};
use crate::worker::WorkerPool;

/// Unique identifier for a resource registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reg-{}", self.0)
    }
}

/// Proof of registration; required to unregister or commit local changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub id: RegistrationId,
    pub resource: ResourceId,
}

impl RegistrationHandle {
    pub fn uri(&self) -> &str {
        &self.resource.uri
    }
}

pub struct Platform {
    config: PlatformConfig,
    resources: DashMap<String, (RegistrationId, Arc<Resource>)>,
    hub: Arc<NotificationHub>,
    pool: WorkerPool,
    next_id: AtomicU64,
    running: AtomicBool,
}

impl Platform {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(
            &config.host,
            config.worker_threads,
            config.max_blocking_threads,
        )?;
        tracing::info!("Platform {} started", config.host);

        Ok(Self {
            config,
            resources: DashMap::new(),
            hub: Arc::new(NotificationHub::new()),
            pool,
            next_id: AtomicU64::new(1),
            running: AtomicBool::new(true),
        })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ResourceError::Transport(format!(
                "platform {} is not running",
                self.config.host
            )))
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Host a handler at `uri`
    ///
    /// `resource_type` must match the handler's own type string, and each URI
    /// can be registered once.
    pub fn register(
        &self,
        uri: &str,
        resource_type: &str,
        interfaces: &[&str],
        properties: ResourceProperties,
        handler: impl Into<ResourceKind>,
    ) -> Result<RegistrationHandle> {
        self.ensure_running()?;
        let handler = handler.into();

        if !uri.starts_with('/') {
            return Err(ResourceError::Validation(format!(
                "resource uri '{}' must start with '/'",
                uri
            )));
        }
        if handler.resource_type() != resource_type {
            return Err(ResourceError::Validation(format!(
                "handler serves '{}', not '{}'",
                handler.resource_type(),
                resource_type
            )));
        }

        match self.resources.entry(uri.to_string()) {
            Entry::Occupied(_) => Err(ResourceError::Validation(format!(
                "resource uri '{}' already registered on {}",
                uri, self.config.host
            ))),
            Entry::Vacant(slot) => {
                let id = RegistrationId(self.next_id.fetch_add(1, Ordering::SeqCst));
                let resource_id = ResourceId::new(self.config.host.clone(), uri);
                let resource = Resource::new(
                    resource_id.clone(),
                    interfaces.iter().map(|i| i.to_string()).collect(),
                    properties,
                    handler,
                    Arc::clone(&self.hub),
                );
                slot.insert((id, Arc::new(resource)));
                tracing::info!("Registered {} ({}) as {}", resource_id, resource_type, id);
                Ok(RegistrationHandle {
                    id,
                    resource: resource_id,
                })
            }
        }
    }

    /// Remove a resource; its observers are dropped
    pub fn unregister(&self, handle: &RegistrationHandle) -> Result<()> {
        let removed = self
            .resources
            .remove_if(handle.uri(), |_, (id, _)| *id == handle.id);
        match removed {
            Some((_, (_, resource))) => {
                let observers = resource.destroy();
                tracing::info!(
                    "Unregistered {} ({} observers dropped)",
                    handle.resource,
                    observers
                );
                Ok(())
            }
            None => Err(ResourceError::NotFound(format!(
                "registration {} for {} not found",
                handle.id, handle.resource
            ))),
        }
    }

    /// Look up a hosted resource by URI
    pub fn resource(&self, uri: &str) -> Option<Arc<Resource>> {
        self.resources.get(uri).map(|entry| Arc::clone(&entry.value().1))
    }

    fn require(&self, uri: &str) -> Result<Arc<Resource>> {
        self.resource(uri).ok_or_else(|| {
            ResourceError::NotFound(format!("no resource at {}{}", self.config.host, uri))
        })
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Route a request to the resource at `uri`
    pub fn dispatch(&self, uri: &str, request: Request) -> Result<HandlerReply> {
        self.ensure_running()?;
        let resource = self.require(uri)?;
        Ok(resource.handle(request, &self.pool))
    }

    /// Discoverable resources of `resource_type`
    pub fn find(&self, resource_type: &str) -> Result<Vec<ResourceHandle>> {
        self.ensure_running()?;
        let mut found: Vec<ResourceHandle> = self
            .resources
            .iter()
            .filter(|entry| {
                let resource = &entry.value().1;
                resource.properties().discoverable && resource.resource_type() == resource_type
            })
            .map(|entry| entry.value().1.descriptor())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    pub fn cancel_observation(&self, uri: &str, observer: ObserverId) -> Result<()> {
        self.ensure_running()?;
        let resource = self.require(uri)?;
        self.hub.unsubscribe(resource.id(), observer)
    }

    /// Apply a device-originated change and notify observers
    pub fn commit_local<F>(&self, handle: &RegistrationHandle, change: F) -> Result<SequenceNumber>
    where
        F: FnOnce(&mut ResourceKind) -> Result<()>,
    {
        self.ensure_running()?;
        let resource = self.registered(handle)?;
        let (_, sequence) = resource.commit_local(change)?;
        Ok(sequence)
    }

    /// The resource behind `handle`, if that registration is still current
    fn registered(&self, handle: &RegistrationHandle) -> Result<Arc<Resource>> {
        match self.resources.get(handle.uri()) {
            Some(entry) if entry.value().0 == handle.id => Ok(Arc::clone(&entry.value().1)),
            _ => Err(ResourceError::NotFound(format!(
                "registration {} for {} not found",
                handle.id, handle.resource
            ))),
        }
    }

    /// Current state of a hosted resource, bypassing request routing
    pub fn snapshot(&self, uri: &str) -> Result<(Representation, SequenceNumber)> {
        self.require(uri)?.snapshot()
    }

    pub fn observer_count(&self, uri: &str) -> usize {
        self.resource(uri)
            .map(|resource| self.hub.observer_count(resource.id()))
            .unwrap_or(0)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Destroy every resource and stop the worker pool
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let uris: Vec<String> = self.resources.iter().map(|e| e.key().clone()).collect();
        for uri in uris {
            if let Some((_, (_, resource))) = self.resources.remove(&uri) {
                resource.destroy();
            }
        }
        self.pool.shutdown();
        tracing::info!("Platform {} shut down", self.config.host);
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NullDevice;
    use crate::handlers::{BinarySwitchHandler, MediaPlayerHandler};
    use resource_model::schema::{binary_switch, media_player, BASELINE_INTERFACE};
    use std::time::Duration;

    fn platform() -> Platform {
        Platform::new(PlatformConfig::for_host("test-host")).unwrap()
    }

    fn register_switch(platform: &Platform, uri: &str) -> Result<RegistrationHandle> {
        platform.register(
            uri,
            binary_switch::RESOURCE_TYPE,
            &[BASELINE_INTERFACE],
            ResourceProperties::default(),
            BinarySwitchHandler::new(false, NullDevice::shared()),
        )
    }

    #[test]
    fn test_registration_ids_display() {
        let platform = platform();
        let handle = register_switch(&platform, "/a/switch").unwrap();
        assert_eq!(handle.id.to_string(), "reg-1");
        assert_eq!(handle.resource.host, "test-host");
    }

    #[test]
    fn test_duplicate_uri_is_rejected() {
        let platform = platform();
        register_switch(&platform, "/a/switch").unwrap();
        assert!(matches!(
            register_switch(&platform, "/a/switch"),
            Err(ResourceError::Validation(_))
        ));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let platform = platform();
        let result = platform.register(
            "/a/switch",
            media_player::RESOURCE_TYPE,
            &[],
            ResourceProperties::default(),
            BinarySwitchHandler::new(false, NullDevice::shared()),
        );
        assert!(matches!(result, Err(ResourceError::Validation(_))));
    }

    #[test]
    fn test_find_skips_hidden_resources() {
        let platform = platform();
        register_switch(&platform, "/a/one").unwrap();
        platform
            .register(
                "/a/two",
                binary_switch::RESOURCE_TYPE,
                &[],
                ResourceProperties {
                    discoverable: false,
                    observable: true,
                },
                BinarySwitchHandler::new(false, NullDevice::shared()),
            )
            .unwrap();

        let found = platform.find(binary_switch::RESOURCE_TYPE).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uri(), "/a/one");
        assert!(platform.find(media_player::RESOURCE_TYPE).unwrap().is_empty());
    }

    #[test]
    fn test_unregister_then_dispatch_is_not_found() {
        let platform = platform();
        let handle = register_switch(&platform, "/a/switch").unwrap();

        platform.unregister(&handle).unwrap();

        assert!(matches!(
            platform.dispatch("/a/switch", Request::Read),
            Err(ResourceError::NotFound(_))
        ));
        assert!(platform.unregister(&handle).is_err());
    }

    #[test]
    fn test_commit_local_track_completion() {
        let platform = platform();
        let handle = platform
            .register(
                "/a/player",
                media_player::RESOURCE_TYPE,
                &[BASELINE_INTERFACE],
                ResourceProperties::default(),
                MediaPlayerHandler::new(
                    vec!["one".to_string(), "two".to_string()],
                    NullDevice::shared(),
                ),
            )
            .unwrap();
        platform
            .dispatch(
                "/a/player",
                Request::update(Representation::new().with(media_player::STATE, "Playing")),
            )
            .unwrap()
            .wait(Duration::from_secs(1))
            .unwrap();

        let sequence = platform
            .commit_local(&handle, |kind| match kind.as_media_player_mut() {
                Some(player) => player.track_completed(),
                None => Err(ResourceError::Validation("not a player".to_string())),
            })
            .unwrap();

        assert_eq!(sequence, SequenceNumber::new(2));
        let (rep, _) = platform.snapshot("/a/player").unwrap();
        assert_eq!(rep.get_str(media_player::TITLE).unwrap(), Some("two"));
    }

    #[test]
    fn test_stale_handle_cannot_commit_to_new_registration() {
        let platform = platform();
        let old = register_switch(&platform, "/a/switch").unwrap();
        platform.unregister(&old).unwrap();
        let current = register_switch(&platform, "/a/switch").unwrap();

        let stale = platform.commit_local(&old, |_| Ok(()));

        assert!(matches!(stale, Err(ResourceError::NotFound(_))));
        assert_eq!(platform.snapshot("/a/switch").unwrap().1, SequenceNumber::ZERO);
        assert_eq!(
            platform.commit_local(&current, |_| Ok(())).unwrap(),
            SequenceNumber::new(1)
        );
    }

    #[test]
    fn test_shutdown_stops_dispatch() {
        let platform = platform();
        register_switch(&platform, "/a/switch").unwrap();

        platform.shutdown();

        assert!(!platform.is_running());
        assert_eq!(platform.resource_count(), 0);
        assert!(matches!(
            platform.dispatch("/a/switch", Request::Read),
            Err(ResourceError::Transport(_))
        ));
    }
}
