use std::sync::Arc;

use crate::events::SimEvent;
use crate::reading::{NodeId, Reading};
use crate::uplink::UplinkChannel;

use super::Mesh;

/// End of the relay path. Pushes every delivery onto the uplink without waiting for it.
pub struct SinkAgent {
    id: NodeId,
    uplink: Arc<UplinkChannel>,
}

impl SinkAgent {
    pub fn new(id: NodeId, uplink: Arc<UplinkChannel>) -> Self { Self { id, uplink } }

    pub fn id(&self) -> &NodeId { &self.id }

    pub fn receive(&self, mesh: &Mesh, reading: Reading, from: NodeId) {
        mesh.events().emit(SimEvent::ReachedSink { reading: reading.clone(), from });
        let uplink = self.uplink.clone();
        mesh.tasks().spawn(async move {
            // loss is reported by the channel itself
            let _ = uplink.send(reading).await;
        });
    }
}
