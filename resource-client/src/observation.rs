use resource_model::{ObserverId, ResourceHandle, SequenceNumber};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A live observation of one remote resource
///
/// Holds identities only; the resource itself stays with its owner. Pass it
/// to [`crate::ResourceClient::cancel`] to stop deliveries.
#[derive(Debug, Clone)]
pub struct ObservationHandle {
    pub(crate) id: ObserverId,
    pub(crate) resource: ResourceHandle,
    pub(crate) initial_sequence: SequenceNumber,
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl ObservationHandle {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    /// Sequence number of the initial delivery
    pub fn initial_sequence(&self) -> SequenceNumber {
        self.initial_sequence
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
