//! Sync-first client for remote resources
//!
//! Requests block the caller until the transport answers or times out.
//! Observation deliveries and background requests run on the client's own
//! bounded pool, so callers never need an async runtime.

use dashmap::DashMap;
use resource_model::{
    observer_channel, Notification, Observer, ObserverId, Representation, ResourceError,
    ResourceHandle, Result, SequenceNumber,
};
use resource_server::WorkerPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use crate::config::ClientConfig;
use crate::discovery::DiscoveryIterator;
use crate::local::{LocalNetwork, LocalTransport};
use crate::observation::ObservationHandle;
use crate::transport::Transport;

struct ActiveObservation {
    resource: ResourceHandle,
    cancelled: Arc<AtomicBool>,
}

/// Client for discovering, reading, updating and observing resources
///
/// # Example
///
/// ```rust,ignore
/// use resource_client::{ClientConfig, ResourceClient};
///
/// let client = ResourceClient::local(network, ClientConfig::default())?;
///
/// for handle in client.discover("x.com.intel.demo.mp3player") {
///     let rep = client.read(&handle)?;
///     let observation = client.observe(&handle, |n| println!("{}: {}", n.sequence, n.representation))?;
///     // ...
///     client.cancel(&observation)?;
/// }
/// ```
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    pool: WorkerPool,
    active: Arc<DashMap<ObserverId, ActiveObservation>>,
}

impl ResourceClient {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new("client", config.worker_threads, config.max_blocking_threads)?;
        Ok(Self {
            transport,
            config,
            pool,
            active: Arc::new(DashMap::new()),
        })
    }

    /// Client over an in-process [`LocalNetwork`]
    pub fn local(network: Arc<LocalNetwork>, config: ClientConfig) -> Result<Self> {
        let transport = LocalTransport::new(network, config.request_timeout);
        Self::new(Arc::new(transport), config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Start discovering resources of `resource_type`
    pub fn discover(&self, resource_type: &str) -> DiscoveryIterator {
        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let wanted = resource_type.to_string();

        let spawned = self.pool.spawn_blocking(move || {
            if let Err(e) = transport.discover(&wanted, tx) {
                tracing::warn!("Discovery for {} failed: {}", wanted, e);
            }
        });

        match spawned {
            Ok(_) => DiscoveryIterator::new(rx, self.config.discovery_timeout),
            Err(e) => {
                tracing::warn!("Could not start discovery: {}", e);
                DiscoveryIterator::empty()
            }
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    pub fn read(&self, resource: &ResourceHandle) -> Result<Representation> {
        self.read_sequenced(resource).map(|(rep, _)| rep)
    }

    /// Read along with the sequence number the representation reflects
    pub fn read_sequenced(&self, resource: &ResourceHandle) -> Result<(Representation, SequenceNumber)> {
        tracing::debug!("GET {}", resource.id);
        self.transport.read(resource)
    }

    /// Post a fragment; returns the resource's post-update representation
    ///
    /// Failures are returned as-is; there is no automatic retry.
    pub fn update(&self, resource: &ResourceHandle, fragment: &Representation) -> Result<Representation> {
        self.update_sequenced(resource, fragment).map(|(rep, _)| rep)
    }

    /// Post a fragment; returns the post-update representation and the
    /// sequence number the update was committed at
    pub fn update_sequenced(
        &self,
        resource: &ResourceHandle,
        fragment: &Representation,
    ) -> Result<(Representation, SequenceNumber)> {
        tracing::debug!("POST {} {}", resource.id, fragment);
        self.transport.update(resource, fragment)
    }

    /// Post a fragment on the background pool and report the outcome
    pub fn update_in_background<F>(
        &self,
        resource: &ResourceHandle,
        fragment: Representation,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(Result<Representation>) + Send + 'static,
    {
        self.update_sequenced_in_background(resource, fragment, move |result| {
            on_complete(result.map(|(rep, _)| rep))
        })
    }

    /// Background variant of [`ResourceClient::update_sequenced`]
    pub fn update_sequenced_in_background<F>(
        &self,
        resource: &ResourceHandle,
        fragment: Representation,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(Result<(Representation, SequenceNumber)>) + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let resource = resource.clone();
        self.pool.spawn_blocking(move || {
            on_complete(transport.update(&resource, &fragment));
        })?;
        Ok(())
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Observe a resource; `callback` receives the initial state and every
    /// later change
    ///
    /// Callbacks run on the client's delivery workers and should not block.
    pub fn observe<F>(&self, resource: &ResourceHandle, mut callback: F) -> Result<ObservationHandle>
    where
        F: FnMut(Notification) + Send + 'static,
    {
        let (sink, mut rx) = observer_channel(self.config.delivery_queue_depth);
        let observer = Observer::new(sink);
        let id = observer.id;

        let initial_sequence = self.transport.observe(resource, observer)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        self.active.insert(
            id,
            ActiveObservation {
                resource: resource.clone(),
                cancelled: Arc::clone(&cancelled),
            },
        );

        let flag = Arc::clone(&cancelled);
        let active = Arc::clone(&self.active);
        let spawned = self.pool.spawn(async move {
            while let Some(notification) = rx.recv().await {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                callback(notification);
            }
            active.remove(&id);
            tracing::debug!("Delivery for observer {} ended", id);
        });

        if let Err(e) = spawned {
            self.active.remove(&id);
            if let Err(cancel_err) = self.transport.cancel(resource, id) {
                tracing::debug!("Cleanup after failed observe: {}", cancel_err);
            }
            return Err(e);
        }
        tracing::debug!("Observing {} as {}", resource.id, id);

        Ok(ObservationHandle {
            id,
            resource: resource.clone(),
            initial_sequence,
            cancelled,
        })
    }

    /// Stop an observation
    ///
    /// No callback starts after this returns, apart from one delivery that
    /// may already be in flight. Cancelling twice is a `NotFound` error.
    pub fn cancel(&self, observation: &ObservationHandle) -> Result<()> {
        if observation.cancelled.swap(true, Ordering::SeqCst) {
            return Err(ResourceError::NotFound(format!(
                "observation {} already cancelled",
                observation.id
            )));
        }
        self.active.remove(&observation.id);
        self.transport.cancel(&observation.resource, observation.id)
    }

    pub fn active_observations(&self) -> usize {
        self.active.len()
    }

    /// Cancel every observation and stop the worker pool
    pub fn shutdown(&self) {
        let ids: Vec<ObserverId> = self.active.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, observation)) = self.active.remove(&id) {
                observation.cancelled.store(true, Ordering::SeqCst);
                if let Err(e) = self.transport.cancel(&observation.resource, id) {
                    tracing::debug!("Cancel of {} during shutdown: {}", id, e);
                }
            }
        }
        self.pool.shutdown();
    }
}

impl Drop for ResourceClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
