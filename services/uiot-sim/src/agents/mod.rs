//! Node behaviors and the per-round mesh that binds each node to its agent.
pub mod relay;
pub mod sensor;
pub mod sink;

pub use relay::RelayAgent;
pub use sensor::{SensorAgent, SensorParams};
pub use sink::SinkAgent;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::events::{EventBus, SimEvent};
use crate::reading::{NodeId, Reading};
use crate::routing::RoutingError;
use crate::tasks::TaskGroup;
use crate::topology::{Role, Topology};
use crate::uplink::UplinkChannel;

pub enum Agent {
    Relay(RelayAgent),
    Sink(SinkAgent),
}

/// One round's wired network. Discarded with the round; in-flight tasks keep
/// it alive only until they finish.
pub struct Mesh {
    topology: Arc<Topology>,
    agents: HashMap<NodeId, Agent>,
    tasks: TaskGroup,
    events: EventBus,
}

impl Mesh {
    pub fn new(topology: Arc<Topology>, uplink: Arc<UplinkChannel>, hop_delay: Duration, tasks: TaskGroup, events: EventBus) -> Arc<Self> {
        let agents = topology
            .nodes()
            .iter()
            .map(|node| {
                let agent = match node.role {
                    Role::Sensor => Agent::Relay(RelayAgent::new(node.id.clone(), hop_delay)),
                    Role::Sink => Agent::Sink(SinkAgent::new(node.id.clone(), uplink.clone())),
                };
                (node.id.clone(), agent)
            })
            .collect();
        Arc::new(Self { topology, agents, tasks, events })
    }

    pub fn topology(&self) -> &Arc<Topology> { &self.topology }

    pub fn events(&self) -> &EventBus { &self.events }

    pub fn tasks(&self) -> &TaskGroup { &self.tasks }

    pub fn agent(&self, id: &NodeId) -> Option<&Agent> { self.agents.get(id) }

    /// Hand `reading` to node `at`. Relays re-enter `forward` as a new task; the sink uplinks.
    pub fn receive(self: &Arc<Self>, at: &NodeId, reading: Reading, from: NodeId) {
        match self.agents.get(at) {
            Some(Agent::Sink(sink)) => sink.receive(self, reading, from),
            Some(Agent::Relay(_)) => self.launch_forward(at.clone(), reading),
            None => self.events.emit(SimEvent::Dropped {
                reading,
                at: from,
                reason: RoutingError::UnknownNode(at.clone()).into(),
            }),
        }
    }

    /// Start a non-blocking forward from `at`; the caller does not wait for it.
    pub fn launch_forward(self: &Arc<Self>, at: NodeId, reading: Reading) {
        let mesh = self.clone();
        self.tasks.spawn(async move {
            match mesh.agents.get(&at) {
                // failures are already reported as Dropped events
                Some(Agent::Relay(relay)) => { let _ = relay.forward(&mesh, reading).await; }
                Some(Agent::Sink(_)) => mesh.events.emit(SimEvent::Dropped { reading, at: at.clone(), reason: RoutingError::DegeneratePath(at).into() }),
                None => mesh.events.emit(SimEvent::Dropped { reading, at: at.clone(), reason: RoutingError::UnknownNode(at).into() }),
            }
        });
    }
}
