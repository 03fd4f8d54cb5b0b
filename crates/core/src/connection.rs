use std::sync::Arc;
use std::time::Duration;

use codec::{AnycastAddress, DataPacket, DecodeResult, ResponsePacket, PAYLOAD_MAX};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

use crate::error::{ListenError, SendError};
use crate::handler::ConnectionHandler;
use crate::primitives::{FloodDecision, FloodEvent, FloodHandle, FloodLayer, MeshEvent, MeshHandle, MeshLayer};
use crate::state::arena::SlotId;
use crate::state::bind::BindTable;
use crate::state::cache::{RecordOutcome, ServerCache};
use crate::state::pending::{PendingBuffer, PendingEntry};
use crate::state::CAPACITY;
use crate::{NodeAddress, TimeoutReason, TIMEOUT};

/// Tuning knobs for [`Connection::open`].
pub struct ConnectionOptions {
    /// Base channel; the flood primitive opens on `channels` and the mesh
    /// primitive on `channels + 1`, per the original channel-allocation
    /// convention.
    pub channels: u8,
    /// Interval for the component-G status tick; `None` disables it.
    pub status_interval: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            channels: 0,
            status_interval: Some(Duration::from_secs(10)),
        }
    }
}

enum Command {
    ListenOn(AnycastAddress, oneshot::Sender<Result<(), ListenError>>),
    Send(AnycastAddress, Vec<u8>, oneshot::Sender<Result<(), SendError>>),
    Close(oneshot::Sender<()>),
}

enum TimerEvent {
    PendingExpired(SlotId),
    CacheExpired(SlotId),
    Tick,
}

/// A façade handle to a running anycast connection.
///
/// The connection's actual state (bind table, pending buffer, cache) lives
/// entirely inside a single `tokio::spawn`ed task that owns it exclusively;
/// every method here just enqueues a command and, where a reply is needed,
/// awaits it. This realizes the single-threaded cooperative scheduling model
/// without any internal locking.
pub struct Connection {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Connection {
    pub fn open<H>(
        node: NodeAddress,
        options: ConnectionOptions,
        flood_layer: Arc<dyn FloodLayer>,
        mesh_layer: Arc<dyn MeshLayer>,
        handler: H,
    ) -> Self
    where
        H: ConnectionHandler,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (flood_events_tx, flood_events_rx) = mpsc::unbounded_channel();
        let (mesh_events_tx, mesh_events_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let flood = flood_layer.open(options.channels, flood_events_tx);
        let mesh = mesh_layer.open(options.channels + 1, mesh_events_tx);

        if let Some(interval) = options.status_interval {
            let tick_tx = timer_tx.clone();
            tokio::spawn(async move {
                loop {
                    sleep(interval).await;
                    if tick_tx.send(TimerEvent::Tick).is_err() {
                        break;
                    }
                }
            });
        }

        let actor = Actor {
            node,
            bind: BindTable::default(),
            pending: PendingBuffer::default(),
            cache: ServerCache::default(),
            seq: 0,
            flood,
            mesh,
            handler,
            timer_tx,
            pending_timers: Default::default(),
            cache_timers: Default::default(),
        };

        tokio::spawn(actor.run(cmd_rx, flood_events_rx, mesh_events_rx, timer_rx));

        Self { cmd_tx }
    }

    pub async fn listen_on(&self, address: AnycastAddress) -> Result<(), ListenError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListenOn(address, tx))
            .map_err(|_| ListenError::Closed)?;
        rx.await.map_err(|_| ListenError::Closed)?
    }

    pub async fn send(&self, address: AnycastAddress, payload: &[u8]) -> Result<(), SendError> {
        if payload.len() > PAYLOAD_MAX {
            log::error!("send: payload of {} bytes exceeds PAYLOAD_MAX", payload.len());
            return Err(SendError::PayloadTooLong(payload.len()));
        }

        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Send(address, payload.to_vec(), tx))
            .map_err(|_| SendError::Closed)?;
        rx.await.map_err(|_| SendError::Closed)?
    }

    pub async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

struct Actor<H: ConnectionHandler> {
    node: NodeAddress,
    bind: BindTable,
    pending: PendingBuffer,
    cache: ServerCache,
    seq: u8,
    flood: Box<dyn FloodHandle>,
    mesh: Box<dyn MeshHandle>,
    handler: H,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    pending_timers: [Option<tokio::task::JoinHandle<()>>; CAPACITY],
    cache_timers: [Option<tokio::task::JoinHandle<()>>; CAPACITY],
}

impl<H: ConnectionHandler> Actor<H> {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut flood_rx: mpsc::UnboundedReceiver<FloodEvent>,
        mut mesh_rx: mpsc::UnboundedReceiver<MeshEvent>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::ListenOn(address, reply)) => {
                            let _ = reply.send(self.handle_listen_on(address));
                        }
                        Some(Command::Send(address, payload, reply)) => {
                            let _ = reply.send(self.handle_send(address, payload));
                        }
                        Some(Command::Close(reply)) => {
                            self.handle_close();
                            let _ = reply.send(());
                            break;
                        }
                        None => {
                            self.handle_close();
                            break;
                        }
                    }
                }
                event = flood_rx.recv() => {
                    match event {
                        Some(event) => self.handle_flood_event(event),
                        None => break,
                    }
                }
                event = mesh_rx.recv() => {
                    match event {
                        Some(event) => self.handle_mesh_event(event),
                        None => break,
                    }
                }
                event = timer_rx.recv() => {
                    match event {
                        Some(event) => self.handle_timer_event(event),
                        None => break,
                    }
                }
            }
        }
    }

    fn handle_listen_on(&mut self, address: AnycastAddress) -> Result<(), ListenError> {
        self.bind.add(address).map_err(|_| ListenError::TableFull)
    }

    fn handle_send(&mut self, address: AnycastAddress, payload: Vec<u8>) -> Result<(), SendError> {
        if let Some(node) = self.cache.lookup(address) {
            self.seq = self.seq.wrapping_add(1);
            self.deliver(node, address, payload);
            return Ok(());
        }

        let seq = self.seq;
        let entry = PendingEntry {
            seq,
            address,
            payload,
        };

        let id = self.pending.insert(entry).map_err(|_| {
            log::warn!("send: pending buffer full, dropping send to address {address}");
            SendError::BufferFull
        })?;
        self.seq = self.seq.wrapping_add(1);
        self.arm_pending_timer(id);
        self.flood.send(seq, address);

        Ok(())
    }

    fn handle_close(&mut self) {
        self.bind.drain();

        for handle in self.pending_timers.iter_mut().chain(self.cache_timers.iter_mut()) {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }

        self.pending.drain();
        self.cache.drain();
    }

    fn handle_flood_event(&mut self, event: FloodEvent) {
        let FloodEvent::Recv { originator, seq, address } = event else {
            return;
        };

        if self.bind.contains(address) {
            let response = ResponsePacket::new(seq, address);
            self.mesh.send(originator, response.encode().to_vec());
            self.flood.resolve(originator, seq, FloodDecision::Consume);
        } else {
            self.flood.resolve(originator, seq, FloodDecision::Propagate);
        }
    }

    fn handle_mesh_event(&mut self, event: MeshEvent) {
        match event {
            MeshEvent::Recv { from, bytes } => self.handle_mesh_recv(from, &bytes),
            MeshEvent::Sent { bytes, .. } => self.handle_mesh_sent(&bytes),
            MeshEvent::Timedout { bytes, .. } => self.handle_mesh_timedout(&bytes),
        }
    }

    fn handle_mesh_recv(&mut self, from: NodeAddress, bytes: &[u8]) {
        let decoded = match codec::decode(bytes) {
            Ok(d) => d,
            Err(e) => {
                log::trace!("mesh recv from {from}: dropping unparseable packet: {e}");
                return;
            }
        };

        match decoded {
            DecodeResult::Response(r) => {
                self.record_cache(r.address, from);

                match self.pending.take(r.address, r.seq, from) {
                    Some((id, entry)) => {
                        if let Some(handle) = self.pending_timers[id.index].take() {
                            handle.abort();
                        }

                        self.deliver(from, entry.address, entry.payload);
                    }
                    None => {
                        log::trace!(
                            "mesh recv from {from}: dropping stray response for address {} seq {}",
                            r.address,
                            r.seq,
                        );
                    }
                }
            }
            DecodeResult::Data(d) => {
                self.handler.recv(from, d.address, &d.payload);
            }
        }
    }

    fn handle_mesh_sent(&mut self, bytes: &[u8]) {
        if let Ok(DecodeResult::Data(d)) = codec::decode(bytes) {
            self.handler.sent(d.address, &d.payload);
        }
    }

    fn handle_mesh_timedout(&mut self, bytes: &[u8]) {
        if let Ok(DecodeResult::Data(d)) = codec::decode(bytes) {
            self.handler.timedout(d.address, TimeoutReason::NoRoute);
        }
    }

    fn handle_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::PendingExpired(id) => {
                self.pending_timers[id.index] = None;
                if let Some(entry) = self.pending.expire(id) {
                    self.handler.timedout(entry.address, TimeoutReason::NoServerFound);
                }
            }
            TimerEvent::CacheExpired(id) => {
                self.cache_timers[id.index] = None;
                self.cache.expire(id);
            }
            TimerEvent::Tick => {
                crate::status::report(self.node, &self.bind, &self.pending, &self.cache);
            }
        }
    }

    fn deliver(&mut self, node: NodeAddress, address: AnycastAddress, payload: Vec<u8>) {
        match DataPacket::new(address, &payload) {
            Ok(packet) => self.mesh.send(node, packet.encode().to_vec()),
            Err(e) => log::error!("dropping oversize pending payload: {e}"),
        }
    }

    fn record_cache(&mut self, address: AnycastAddress, node: NodeAddress) {
        match self.cache.record(address, node) {
            RecordOutcome::Inserted(id) => self.arm_cache_timer(id),
            RecordOutcome::Refreshed(id) => self.arm_cache_timer(id),
            RecordOutcome::Dropped => {}
        }
    }

    fn arm_pending_timer(&mut self, id: SlotId) {
        if let Some(old) = self.pending_timers[id.index].take() {
            old.abort();
        }

        let tx = self.timer_tx.clone();
        self.pending_timers[id.index] = Some(tokio::spawn(async move {
            sleep(TIMEOUT).await;
            let _ = tx.send(TimerEvent::PendingExpired(id));
        }));
    }

    fn arm_cache_timer(&mut self, id: SlotId) {
        if let Some(old) = self.cache_timers[id.index].take() {
            old.abort();
        }

        let tx = self.timer_tx.clone();
        self.cache_timers[id.index] = Some(tokio::spawn(async move {
            sleep(TIMEOUT).await;
            let _ = tx.send(TimerEvent::CacheExpired(id));
        }));
    }
}
