use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anycast_core::{
    FloodDecision, FloodEvent, FloodHandle, FloodLayer, MeshEvent, MeshHandle, MeshLayer, NodeAddress,
};
use codec::AnycastAddress;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

struct Registry {
    flood: Vec<(NodeAddress, UnboundedSender<FloodEvent>)>,
    mesh: HashMap<NodeAddress, UnboundedSender<MeshEvent>>,
}

/// A shared, idealized network: every flood reaches every other node in one
/// hop; every mesh send to a registered node succeeds, after `latency`; a
/// mesh send to an address nobody has opened a connection on times out.
pub struct Network {
    registry: Mutex<Registry>,
    latency: Duration,
}

impl Network {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(Registry {
                flood: Vec::new(),
                mesh: HashMap::new(),
            }),
            latency,
        })
    }

    /// Obtain a node-scoped view of this network, suitable for
    /// `anycast_core::Connection::open`.
    pub fn node(self: &Arc<Self>, node: NodeAddress) -> NetworkNode {
        NetworkNode {
            network: self.clone(),
            node,
        }
    }
}

/// One node's view of the shared [`Network`]; implements both
/// [`FloodLayer`] and [`MeshLayer`] for that node.
pub struct NetworkNode {
    network: Arc<Network>,
    node: NodeAddress,
}

impl FloodLayer for NetworkNode {
    fn open(&self, _channel: u8, events: UnboundedSender<FloodEvent>) -> Box<dyn FloodHandle> {
        self.network
            .registry
            .lock()
            .unwrap()
            .flood
            .push((self.node, events));

        Box::new(SimFlood {
            network: self.network.clone(),
            origin: self.node,
        })
    }
}

impl MeshLayer for NetworkNode {
    fn open(&self, _channel: u8, events: UnboundedSender<MeshEvent>) -> Box<dyn MeshHandle> {
        self.network
            .registry
            .lock()
            .unwrap()
            .mesh
            .insert(self.node, events.clone());

        Box::new(SimMesh {
            network: self.network.clone(),
            origin: self.node,
            origin_events: events,
        })
    }
}

struct SimFlood {
    network: Arc<Network>,
    origin: NodeAddress,
}

impl FloodHandle for SimFlood {
    fn send(&self, seq: u8, address: AnycastAddress) {
        let origin = self.origin;
        let latency = self.network.latency;
        let targets: Vec<_> = self
            .network
            .registry
            .lock()
            .unwrap()
            .flood
            .iter()
            .filter(|(node, _)| *node != origin)
            .map(|(_, tx)| tx.clone())
            .collect();

        for tx in targets {
            tokio::spawn(async move {
                sleep(latency).await;
                let _ = tx.send(FloodEvent::Recv {
                    originator: origin,
                    seq,
                    address,
                });
            });
        }
    }

    fn resolve(&self, _originator: NodeAddress, _seq: u8, _decision: FloodDecision) {
        // An idealized flood has already reached every node in one hop;
        // there is nothing further to propagate or suppress.
    }
}

struct SimMesh {
    network: Arc<Network>,
    origin: NodeAddress,
    origin_events: UnboundedSender<MeshEvent>,
}

impl MeshHandle for SimMesh {
    fn send(&self, dest: NodeAddress, bytes: Vec<u8>) {
        let origin = self.origin;
        let latency = self.network.latency;
        let origin_events = self.origin_events.clone();
        let dest_events = self.network.registry.lock().unwrap().mesh.get(&dest).cloned();

        tokio::spawn(async move {
            sleep(latency).await;

            match dest_events {
                Some(dest_events) => {
                    let _ = dest_events.send(MeshEvent::Recv {
                        from: origin,
                        bytes: bytes.clone(),
                    });
                    let _ = origin_events.send(MeshEvent::Sent { dest, bytes });
                }
                None => {
                    let _ = origin_events.send(MeshEvent::Timedout { dest, bytes });
                }
            }
        });
    }
}
