use std::sync::{Arc, Mutex};
use std::time::Duration;

use anycast_core::{
    Connection, ConnectionHandler, ConnectionOptions, MeshEvent, MeshHandle, MeshLayer, NodeAddress,
    SendError, TimeoutReason,
};
use codec::AnycastAddress;
use sim::Network;
use tokio::sync::mpsc;

#[derive(Default, Clone)]
struct Recorder {
    inner: Arc<Mutex<RecorderState>>,
}

#[derive(Default)]
struct RecorderState {
    received: Vec<(NodeAddress, AnycastAddress, Vec<u8>)>,
    sent: Vec<(AnycastAddress, Vec<u8>)>,
    timedout: Vec<(AnycastAddress, TimeoutReason)>,
}

struct RecordingHandler {
    recorder: Recorder,
}

impl ConnectionHandler for RecordingHandler {
    fn recv(&mut self, originator: NodeAddress, address: AnycastAddress, payload: &[u8]) {
        self.recorder
            .inner
            .lock()
            .unwrap()
            .received
            .push((originator, address, payload.to_vec()));
    }

    fn sent(&mut self, address: AnycastAddress, payload: &[u8]) {
        self.recorder
            .inner
            .lock()
            .unwrap()
            .sent
            .push((address, payload.to_vec()));
    }

    fn timedout(&mut self, address: AnycastAddress, reason: TimeoutReason) {
        self.recorder
            .inner
            .lock()
            .unwrap()
            .timedout
            .push((address, reason));
    }
}

fn opts() -> ConnectionOptions {
    ConnectionOptions {
        channels: 0,
        status_interval: None,
    }
}

/// Let real-time-scheduled tasks (the simulated network's per-send latency)
/// finish before asserting on recorded callbacks.
async fn settle_real_time() {
    tokio::time::sleep(Duration::from_millis(50)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// A [`MeshLayer`] that still registers for incoming events on the real
/// network (so a RESPONSE destined for this node still arrives) but turns
/// every outgoing send into an immediate route failure, for exercising the
/// `ERR_NO_ROUTE` path without needing the simulated network itself to model
/// partial reachability.
struct FlakyMeshLayer {
    inner: Arc<dyn MeshLayer>,
}

impl MeshLayer for FlakyMeshLayer {
    fn open(&self, channel: u8, events: mpsc::UnboundedSender<MeshEvent>) -> Box<dyn MeshHandle> {
        let _ = self.inner.open(channel, events.clone());
        Box::new(FlakyMesh { events })
    }
}

struct FlakyMesh {
    events: mpsc::UnboundedSender<MeshEvent>,
}

impl MeshHandle for FlakyMesh {
    fn send(&self, dest: NodeAddress, bytes: Vec<u8>) {
        let _ = self.events.send(MeshEvent::Timedout { dest, bytes });
    }
}

#[tokio::test]
async fn client_discovers_and_delivers_to_the_one_server() {
    let net = Network::new(Duration::from_millis(1));

    let server_recorder = Recorder::default();
    let server = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: server_recorder.clone(),
        },
    );

    let client_recorder = Recorder::default();
    let client = Connection::open(
        NodeAddress(2),
        opts(),
        Arc::new(net.node(NodeAddress(2))),
        Arc::new(net.node(NodeAddress(2))),
        RecordingHandler {
            recorder: client_recorder.clone(),
        },
    );

    let service = AnycastAddress::new(5).unwrap();
    server.listen_on(service).await.unwrap();

    client.send(service, b"hello").await.unwrap();
    settle_real_time().await;

    {
        let server_state = server_recorder.inner.lock().unwrap();
        assert_eq!(server_state.received.len(), 1);
        assert_eq!(server_state.received[0].1, service);
        assert_eq!(server_state.received[0].2, b"hello");
    }

    {
        let client_state = client_recorder.inner.lock().unwrap();
        assert_eq!(client_state.sent.len(), 1);
        assert_eq!(client_state.sent[0].0, service);
    }

    server.close().await;
    client.close().await;
}

#[tokio::test(start_paused = true)]
async fn send_to_unserved_address_times_out_with_no_server_found() {
    let net = Network::new(Duration::from_millis(1));

    let client_recorder = Recorder::default();
    let client = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: client_recorder.clone(),
        },
    );

    let service = AnycastAddress::new(9).unwrap();
    client.send(service, b"ping").await.unwrap();

    tokio::time::advance(anycast_core::TIMEOUT + Duration::from_secs(1)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let state = client_recorder.inner.lock().unwrap();
    assert_eq!(state.timedout, vec![(service, TimeoutReason::NoServerFound)]);

    drop(state);
    client.close().await;
}

#[tokio::test]
async fn second_send_after_a_response_is_cached_and_still_delivered() {
    let net = Network::new(Duration::from_millis(1));

    let server_recorder = Recorder::default();
    let server = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: server_recorder.clone(),
        },
    );

    let client = Connection::open(
        NodeAddress(2),
        opts(),
        Arc::new(net.node(NodeAddress(2))),
        Arc::new(net.node(NodeAddress(2))),
        RecordingHandler {
            recorder: Recorder::default(),
        },
    );

    let service = AnycastAddress::new(3).unwrap();
    server.listen_on(service).await.unwrap();

    client.send(service, b"first").await.unwrap();
    settle_real_time().await;
    client.send(service, b"second").await.unwrap();
    settle_real_time().await;

    let state = server_recorder.inner.lock().unwrap();
    assert_eq!(state.received.len(), 2);
    assert_eq!(state.received[1].2, b"second");

    drop(state);
    server.close().await;
    client.close().await;
}

#[tokio::test]
async fn oversize_payload_is_rejected_without_touching_the_network() {
    let net = Network::new(Duration::from_millis(1));
    let client = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: Recorder::default(),
        },
    );

    let service = AnycastAddress::new(4).unwrap();
    let oversize = vec![0u8; codec::PAYLOAD_MAX + 1];
    let err = client.send(service, &oversize).await.unwrap_err();
    assert_eq!(err, anycast_core::SendError::PayloadTooLong(oversize.len()));

    client.close().await;
}

#[tokio::test]
async fn closing_a_connection_rejects_further_calls() {
    let net = Network::new(Duration::from_millis(1));
    let client = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: Recorder::default(),
        },
    );

    let service = AnycastAddress::new(6).unwrap();
    client.close().await;

    let err = client.send(service, b"late").await.unwrap_err();
    assert_eq!(err, anycast_core::SendError::Closed);
}

#[tokio::test]
async fn server_found_but_mesh_delivery_fails_reports_no_route() {
    let net = Network::new(Duration::from_millis(1));

    let server = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: Recorder::default(),
        },
    );

    let client_recorder = Recorder::default();
    let flaky_mesh: Arc<dyn MeshLayer> = Arc::new(FlakyMeshLayer {
        inner: Arc::new(net.node(NodeAddress(2))),
    });
    let client = Connection::open(
        NodeAddress(2),
        opts(),
        Arc::new(net.node(NodeAddress(2))),
        flaky_mesh,
        RecordingHandler {
            recorder: client_recorder.clone(),
        },
    );

    let service = AnycastAddress::new(7).unwrap();
    server.listen_on(service).await.unwrap();

    client.send(service, b"hello").await.unwrap();
    settle_real_time().await;

    let state = client_recorder.inner.lock().unwrap();
    assert_eq!(state.timedout, vec![(service, TimeoutReason::NoRoute)]);

    drop(state);
    server.close().await;
    client.close().await;
}

#[tokio::test]
async fn first_of_two_servers_to_respond_wins() {
    let net = Network::new(Duration::from_millis(1));

    let server_a_recorder = Recorder::default();
    let server_a = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: server_a_recorder.clone(),
        },
    );

    let server_b_recorder = Recorder::default();
    let server_b = Connection::open(
        NodeAddress(3),
        opts(),
        Arc::new(net.node(NodeAddress(3))),
        Arc::new(net.node(NodeAddress(3))),
        RecordingHandler {
            recorder: server_b_recorder.clone(),
        },
    );

    let client = Connection::open(
        NodeAddress(2),
        opts(),
        Arc::new(net.node(NodeAddress(2))),
        Arc::new(net.node(NodeAddress(2))),
        RecordingHandler {
            recorder: Recorder::default(),
        },
    );

    let service = AnycastAddress::new(8).unwrap();
    server_a.listen_on(service).await.unwrap();
    server_b.listen_on(service).await.unwrap();

    client.send(service, b"hello").await.unwrap();
    settle_real_time().await;

    let received_a = server_a_recorder.inner.lock().unwrap().received.len();
    let received_b = server_b_recorder.inner.lock().unwrap().received.len();
    assert_eq!(
        received_a + received_b,
        1,
        "exactly one of the two servers should have received the delivery"
    );

    server_a.close().await;
    server_b.close().await;
    client.close().await;
}

#[tokio::test(start_paused = true)]
async fn sixth_concurrent_send_is_rejected_and_the_rest_time_out() {
    let net = Network::new(Duration::from_millis(1));

    let client_recorder = Recorder::default();
    let client = Connection::open(
        NodeAddress(1),
        opts(),
        Arc::new(net.node(NodeAddress(1))),
        Arc::new(net.node(NodeAddress(1))),
        RecordingHandler {
            recorder: client_recorder.clone(),
        },
    );

    let addrs: Vec<AnycastAddress> = (1..=6u8).map(|v| AnycastAddress::new(v).unwrap()).collect();

    for address in &addrs[..5] {
        client.send(*address, b"x").await.unwrap();
    }

    let err = client.send(addrs[5], b"x").await.unwrap_err();
    assert_eq!(err, SendError::BufferFull);

    tokio::time::advance(anycast_core::TIMEOUT + Duration::from_secs(1)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let state = client_recorder.inner.lock().unwrap();
    assert_eq!(state.timedout.len(), 5);
    for address in &addrs[..5] {
        assert!(state.timedout.contains(&(*address, TimeoutReason::NoServerFound)));
    }

    drop(state);
    client.close().await;
}
