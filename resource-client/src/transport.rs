//! The seam between the client and whatever carries its requests
//!
//! All operations are blocking. Implementations own timeouts; callers never
//! wait longer than the transport allows.

use resource_model::{
    Observer, ObserverId, Representation, ResourceHandle, Result, SequenceNumber,
};
use std::sync::mpsc;

pub trait Transport: Send + Sync + 'static {
    /// Report every reachable resource of `resource_type` through `found`
    ///
    /// Returns once every responder is done. Hosts that fail are skipped; a
    /// closed `found` channel means the consumer lost interest and discovery
    /// can stop early.
    fn discover(&self, resource_type: &str, found: mpsc::Sender<ResourceHandle>) -> Result<()>;

    fn read(&self, resource: &ResourceHandle) -> Result<(Representation, SequenceNumber)>;

    /// Post a fragment; returns the post-update representation
    fn update(
        &self,
        resource: &ResourceHandle,
        fragment: &Representation,
    ) -> Result<(Representation, SequenceNumber)>;

    /// Register an observer; returns the sequence of its initial delivery
    fn observe(&self, resource: &ResourceHandle, observer: Observer) -> Result<SequenceNumber>;

    fn cancel(&self, resource: &ResourceHandle, observer: ObserverId) -> Result<()>;
}
