//! Keeps a local state machine in step with one remote resource
//!
//! Binding reads the resource once, then observes it. Responses and
//! notifications share one sequence order, so a late response never undoes
//! a newer notification. Requests post a fragment and apply the server's
//! answer; when a request fails the binding re-reads so the local view
//! converges on whatever the resource actually holds.

use parking_lot::Mutex;
use resource_client::{ObservationHandle, ResourceClient};
use resource_model::{PlayerState, Representation, ResourceHandle, Result};
use std::sync::Arc;

use crate::player::PlayerMachine;
use crate::reconciler::{Reconciled, StateMachine, StateReconciler};
use crate::sink::StateSink;

pub struct Binding<M: StateMachine + 'static> {
    client: Arc<ResourceClient>,
    resource: ResourceHandle,
    reconciler: Arc<StateReconciler<M>>,
    observation: Mutex<Option<ObservationHandle>>,
}

impl<M: StateMachine + 'static> Binding<M> {
    pub fn bind(
        client: Arc<ResourceClient>,
        resource: ResourceHandle,
        machine: M,
        sink: Arc<dyn StateSink<M::State>>,
    ) -> Result<Self> {
        let reconciler = Arc::new(StateReconciler::new(machine, sink));

        let (rep, seq) = client.read_sequenced(&resource)?;
        reconciler.apply_response_at(&rep, seq);

        let observer = Arc::clone(&reconciler);
        let observation = client.observe(&resource, move |notification| {
            observer.apply_notification(&notification);
        })?;
        tracing::debug!("Bound {} as {}", resource.id, observation.id());

        Ok(Self {
            client,
            resource,
            reconciler,
            observation: Mutex::new(Some(observation)),
        })
    }

    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    pub fn reconciler(&self) -> &Arc<StateReconciler<M>> {
        &self.reconciler
    }

    pub fn state(&self) -> M::State {
        self.reconciler.current()
    }

    pub fn is_bound(&self) -> bool {
        self.observation.lock().is_some()
    }

    /// Post a fragment and apply the post-update representation
    ///
    /// On failure the resource is read again before the error is returned.
    pub fn request(&self, fragment: Representation) -> Result<Reconciled> {
        match self.client.update_sequenced(&self.resource, &fragment) {
            Ok((rep, seq)) => Ok(self.reconciler.apply_response_at(&rep, seq)),
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", self.resource.id, e);
                if let Err(read_err) = self.refresh() {
                    tracing::warn!("Re-read of {} failed: {}", self.resource.id, read_err);
                }
                Err(e)
            }
        }
    }

    /// Same as [`Binding::request`], run on the client's background pool
    pub fn spawn_request<F>(&self, fragment: Representation, on_done: F) -> Result<()>
    where
        F: FnOnce(Result<Reconciled>) + Send + 'static,
    {
        let reconciler = Arc::clone(&self.reconciler);
        let transport = self.client.transport();
        let resource = self.resource.clone();

        self.client
            .update_sequenced_in_background(&self.resource, fragment, move |result| {
                let outcome = match result {
                    Ok((rep, seq)) => Ok(reconciler.apply_response_at(&rep, seq)),
                    Err(e) => {
                        tracing::warn!("Background request to {} failed: {}", resource.id, e);
                        match transport.read(&resource) {
                            Ok((rep, seq)) => {
                                reconciler.apply_response_at(&rep, seq);
                            }
                            Err(read_err) => {
                                tracing::warn!("Re-read of {} failed: {}", resource.id, read_err);
                            }
                        }
                        Err(e)
                    }
                };
                on_done(outcome);
            })
    }

    /// Read the resource again and apply it unless a newer notification
    /// has already arrived
    pub fn refresh(&self) -> Result<Reconciled> {
        let (rep, seq) = self.client.read_sequenced(&self.resource)?;
        Ok(self.reconciler.apply_response_at(&rep, seq))
    }

    /// Stop observing; the local state keeps its last value
    pub fn unbind(&self) -> Result<()> {
        let observation = self.observation.lock().take();
        match observation {
            Some(observation) => self.client.cancel(&observation),
            None => Ok(()),
        }
    }
}

impl<M: StateMachine + 'static> Drop for Binding<M> {
    fn drop(&mut self) {
        if let Err(e) = self.unbind() {
            tracing::debug!("Unbind of {} on drop: {}", self.resource.id, e);
        }
    }
}

// ============================================================================
// Player controls
// ============================================================================

impl Binding<PlayerMachine> {
    /// Pause when playing, play otherwise
    pub fn play_pause(&self) -> Result<Reconciled> {
        let fragment = self
            .reconciler
            .with_machine(|m| m.request_for(m.toggle_target()))?;
        self.request(fragment)
    }

    pub fn stop(&self) -> Result<Reconciled> {
        let fragment = self
            .reconciler
            .with_machine(|m| m.request_for(PlayerState::Idle))?;
        self.request(fragment)
    }

    pub fn select(&self, index: usize) -> Result<Reconciled> {
        let fragment = self.reconciler.with_machine(|m| m.select_request(index))?;
        self.request(fragment)
    }

    pub fn title(&self) -> Option<String> {
        self.reconciler.with_machine(|m| m.title().map(str::to_string))
    }
}
