use std::sync::Arc;
use std::time::Duration;

use crate::events::SimEvent;
use crate::reading::{NodeId, Reading};
use crate::routing::{RoutingError, RoutingResolver};

use super::Mesh;

/// Forwarding behavior shared by every sensor node.
pub struct RelayAgent {
    id: NodeId,
    hop_delay: Duration,
    resolver: RoutingResolver,
}

impl RelayAgent {
    pub fn new(id: NodeId, hop_delay: Duration) -> Self { Self { id, hop_delay, resolver: RoutingResolver } }

    pub fn id(&self) -> &NodeId { &self.id }

    /// Move `reading` one hop toward the sink.
    ///
    /// Resolves the next hop from this node, waits the hop delay, then hands the
    /// reading to that node's `receive`. A routing failure drops the reading and
    /// is reported both as the return value and as a `Dropped` event.
    pub async fn forward(&self, mesh: &Arc<Mesh>, reading: Reading) -> Result<NodeId, RoutingError> {
        let next = match self.resolver.next_hop(mesh.topology(), &self.id) {
            Ok(next) => next,
            Err(e) => {
                mesh.events().emit(SimEvent::Dropped { reading, at: self.id.clone(), reason: e.clone().into() });
                return Err(e);
            }
        };
        tokio::time::sleep(self.hop_delay).await;
        mesh.events().emit(SimEvent::Relayed { reading: reading.clone(), from: self.id.clone(), to: next.clone() });
        mesh.receive(&next, reading, self.id.clone());
        Ok(next)
    }
}
