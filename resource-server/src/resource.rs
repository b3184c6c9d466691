//! A hosted resource: identity, handler state and its sequence counter
//!
//! Each resource guards its handler and sequence number with its own
//! read/write lock. Reads share the lock and never observe a half-applied
//! update. Updates hold the write lock across validate, apply, sequence bump
//! and fan-out, so observers see changes in commit order.

use parking_lot::RwLock;
use resource_model::{
    Observer, Representation, ResourceError, ResourceHandle, ResourceId, Result, SequenceNumber,
};
use std::sync::Arc;

use crate::handler::{ReadMode, ResourceHandler};
use crate::handlers::ResourceKind;
use crate::hub::NotificationHub;
use crate::request::{deferred, HandlerReply, Request, Response};
use crate::worker::WorkerPool;

/// Discovery and observation flags chosen at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceProperties {
    pub discoverable: bool,
    pub observable: bool,
}

impl Default for ResourceProperties {
    fn default() -> Self {
        Self {
            discoverable: true,
            observable: true,
        }
    }
}

struct ResourceState {
    handler: ResourceKind,
    sequence: SequenceNumber,
    destroyed: bool,
}

pub struct Resource {
    id: ResourceId,
    resource_type: &'static str,
    interfaces: Vec<String>,
    properties: ResourceProperties,
    state: RwLock<ResourceState>,
    hub: Arc<NotificationHub>,
}

impl Resource {
    pub(crate) fn new(
        id: ResourceId,
        interfaces: Vec<String>,
        properties: ResourceProperties,
        handler: ResourceKind,
        hub: Arc<NotificationHub>,
    ) -> Self {
        if properties.observable {
            hub.open(&id);
        }
        Self {
            resource_type: handler.resource_type(),
            id,
            interfaces,
            properties,
            state: RwLock::new(ResourceState {
                handler,
                sequence: SequenceNumber::ZERO,
                destroyed: false,
            }),
            hub,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn properties(&self) -> ResourceProperties {
        self.properties
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.state.read().sequence
    }

    /// What discovery reports for this resource
    pub fn descriptor(&self) -> ResourceHandle {
        ResourceHandle {
            id: self.id.clone(),
            resource_types: vec![self.resource_type.to_string()],
            interfaces: self.interfaces.clone(),
            observable: self.properties.observable,
        }
    }

    /// Answer one request
    ///
    /// Deferred reads are handed to `pool` and answered through an
    /// in-progress reply.
    pub fn handle(self: &Arc<Self>, request: Request, pool: &WorkerPool) -> HandlerReply {
        tracing::debug!("{:?} request for {}", request.kind(), self.id);
        match request {
            Request::Init => HandlerReply::Ready(self.respond(self.handshake())),
            Request::Read => self.read(pool),
            Request::Update(None) => HandlerReply::Ready(self.respond(Err(
                ResourceError::Validation("update without a representation".to_string()),
            ))),
            Request::Update(Some(fragment)) => {
                HandlerReply::Ready(self.respond(self.update(&fragment).map(Some)))
            }
            Request::ObserverRegister(observer) => {
                HandlerReply::Ready(self.respond(self.observe(observer).map(Some)))
            }
        }
    }

    fn respond(&self, result: Result<Option<(Representation, SequenceNumber)>>) -> Response {
        match result {
            Ok(Some((rep, sequence))) => Response::ok(Some(rep), sequence),
            Ok(None) => Response::ok(None, self.sequence()),
            Err(err) => Response::from_error(&err, self.sequence()),
        }
    }

    fn handshake(&self) -> Result<Option<(Representation, SequenceNumber)>> {
        if self.state.read().destroyed {
            return Err(self.gone());
        }
        Ok(None)
    }

    fn read(self: &Arc<Self>, pool: &WorkerPool) -> HandlerReply {
        let mode = self.state.read().handler.read_mode();
        match mode {
            ReadMode::Immediate => HandlerReply::Ready(self.respond(self.snapshot().map(Some))),
            ReadMode::Deferred => {
                let (responder, pending) = deferred();
                let resource = Arc::clone(self);
                let spawned = pool.spawn_blocking(move || {
                    let response = resource.respond(resource.snapshot().map(Some));
                    responder.send(response);
                });
                match spawned {
                    Ok(_) => HandlerReply::InProgress(pending),
                    Err(err) => HandlerReply::Ready(self.respond(Err(err))),
                }
            }
        }
    }

    /// Current representation and the sequence it reflects
    pub fn snapshot(&self) -> Result<(Representation, SequenceNumber)> {
        let state = self.state.read();
        if state.destroyed {
            return Err(self.gone());
        }
        Ok((state.handler.representation(), state.sequence))
    }

    /// Apply a remote update fragment
    pub fn update(&self, fragment: &Representation) -> Result<(Representation, SequenceNumber)> {
        self.commit(|handler| handler.update(fragment))
    }

    /// Apply a change that originated on this device (e.g. a track ending)
    ///
    /// Committed and published exactly like a remote update.
    pub fn commit_local<F>(&self, change: F) -> Result<(Representation, SequenceNumber)>
    where
        F: FnOnce(&mut ResourceKind) -> Result<()>,
    {
        self.commit(change)
    }

    fn commit<F>(&self, change: F) -> Result<(Representation, SequenceNumber)>
    where
        F: FnOnce(&mut ResourceKind) -> Result<()>,
    {
        let mut state = self.state.write();
        if state.destroyed {
            return Err(self.gone());
        }

        if let Err(err) = change(&mut state.handler) {
            tracing::warn!("Rejected change to {}: {}", self.id, err);
            return Err(err);
        }

        state.sequence = state.sequence.next();
        let rep = state.handler.representation();
        if self.properties.observable {
            let report = self.hub.publish(&self.id, state.sequence, &rep);
            tracing::debug!(
                "Committed {} on {} ({} delivered, {} dropped)",
                state.sequence,
                self.id,
                report.delivered,
                report.dropped
            );
        }
        Ok((rep, state.sequence))
    }

    /// Register an observer; it receives the current state first
    pub fn observe(&self, observer: Observer) -> Result<(Representation, SequenceNumber)> {
        if !self.properties.observable {
            return Err(ResourceError::Validation(format!(
                "resource {} is not observable",
                self.id
            )));
        }

        let state = self.state.read();
        if state.destroyed {
            return Err(self.gone());
        }
        let rep = state.handler.representation();
        self.hub
            .subscribe(&self.id, observer, state.sequence, rep.clone())?;
        Ok((rep, state.sequence))
    }

    /// Mark destroyed and drop every observer; returns how many were dropped
    pub(crate) fn destroy(&self) -> usize {
        let mut state = self.state.write();
        state.destroyed = true;
        self.hub.close(&self.id)
    }

    fn gone(&self) -> ResourceError {
        ResourceError::NotFound(format!("resource {} was destroyed", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NullDevice;
    use crate::handlers::{BrightnessHandler, MediaPlayerHandler};
    use crate::request::ResponseOutcome;
    use resource_model::{codec, observer_channel, schema};
    use std::time::Duration;

    fn player() -> Arc<Resource> {
        let handler = MediaPlayerHandler::new(vec!["one".to_string()], NullDevice::shared());
        Arc::new(Resource::new(
            ResourceId::new("host", "/a/player"),
            vec![schema::BASELINE_INTERFACE.to_string()],
            ResourceProperties::default(),
            handler.into(),
            Arc::new(NotificationHub::new()),
        ))
    }

    fn pool() -> WorkerPool {
        WorkerPool::new("test", 1, 2).unwrap()
    }

    fn state_update(name: &str) -> Request {
        Request::update(Representation::new().with(schema::media_player::STATE, name))
    }

    #[test]
    fn test_update_increments_sequence_once() {
        let resource = player();
        let pool = pool();

        let response = resource
            .handle(state_update("Playing"), &pool)
            .wait(Duration::from_secs(1))
            .unwrap();

        assert!(response.is_ok());
        assert_eq!(response.sequence, SequenceNumber::new(1));
        assert_eq!(resource.sequence(), SequenceNumber::new(1));
    }

    #[test]
    fn test_rejected_update_leaves_bytes_identical() {
        let resource = player();
        let pool = pool();
        let (before, seq_before) = resource.snapshot().unwrap();

        let response = resource
            .handle(state_update("Bogus"), &pool)
            .wait(Duration::from_secs(1))
            .unwrap();

        assert!(matches!(response.outcome, ResponseOutcome::ClientError(_)));
        let (after, seq_after) = resource.snapshot().unwrap();
        assert_eq!(codec::encode(&before).unwrap(), codec::encode(&after).unwrap());
        assert_eq!(seq_before, seq_after);
    }

    #[test]
    fn test_update_without_body_is_client_error() {
        let resource = player();
        let response = resource
            .handle(Request::Update(None), &pool())
            .wait(Duration::from_secs(1))
            .unwrap();
        assert!(matches!(response.outcome, ResponseOutcome::ClientError(_)));
        assert_eq!(resource.sequence(), SequenceNumber::ZERO);
    }

    #[test]
    fn test_init_has_no_side_effects() {
        let resource = player();
        let response = resource
            .handle(Request::Init, &pool())
            .wait(Duration::from_secs(1))
            .unwrap();
        assert!(response.is_ok());
        assert!(response.representation.is_none());
        assert_eq!(resource.sequence(), SequenceNumber::ZERO);
    }

    #[test]
    fn test_deferred_read_completes_from_pool() {
        let resource = Arc::new(Resource::new(
            ResourceId::new("host", "/a/light"),
            vec![],
            ResourceProperties::default(),
            BrightnessHandler::new(30, NullDevice::shared()).into(),
            Arc::new(NotificationHub::new()),
        ));
        let pool = pool();

        let reply = resource.handle(Request::Read, &pool);
        assert!(matches!(reply, HandlerReply::InProgress(_)));

        let response = reply.wait(Duration::from_secs(2)).unwrap();
        let rep = response.representation.unwrap();
        assert_eq!(rep.get_int(schema::brightness::BRIGHTNESS).unwrap(), Some(30));
    }

    #[test]
    fn test_observer_gets_initial_then_updates() {
        let resource = player();
        let pool = pool();
        let (sink, mut rx) = observer_channel(8);

        resource
            .handle(Request::ObserverRegister(Observer::new(sink)), &pool)
            .wait(Duration::from_secs(1))
            .unwrap();
        resource.handle(state_update("Playing"), &pool);
        resource.handle(state_update("Bogus"), &pool);

        let initial = rx.try_recv().unwrap();
        let change = rx.try_recv().unwrap();
        assert_eq!(initial.sequence, SequenceNumber::ZERO);
        assert_eq!(change.sequence, SequenceNumber::new(1));
        assert_eq!(
            change.representation.get_str(schema::media_player::STATE).unwrap(),
            Some("Playing")
        );
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_non_observable_resource_refuses_observers() {
        let resource = Arc::new(Resource::new(
            ResourceId::new("host", "/a/hidden"),
            vec![],
            ResourceProperties {
                discoverable: false,
                observable: false,
            },
            BrightnessHandler::new(0, NullDevice::shared()).into(),
            Arc::new(NotificationHub::new()),
        ));
        let (sink, _rx) = observer_channel(8);

        assert!(matches!(
            resource.observe(Observer::new(sink)),
            Err(ResourceError::Validation(_))
        ));
    }

    #[test]
    fn test_destroyed_resource_is_not_found() {
        let resource = player();
        let (sink, _rx) = observer_channel(8);
        resource.observe(Observer::new(sink)).unwrap();

        assert_eq!(resource.destroy(), 1);

        let response = resource
            .handle(Request::Read, &pool())
            .wait(Duration::from_secs(1))
            .unwrap();
        assert!(matches!(response.outcome, ResponseOutcome::NotFound(_)));
        assert!(matches!(
            resource.update(&Representation::new()),
            Err(ResourceError::NotFound(_))
        ));
    }
}
