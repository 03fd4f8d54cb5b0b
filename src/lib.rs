pub mod config;
pub mod handler;

use std::sync::Arc;
use std::time::Duration;

use anycast_core::{Connection, ConnectionOptions, NodeAddress};
use codec::AnycastAddress;
use sim::Network;

use self::config::Config;
use self::handler::LoggingHandler;

/// Build the simulated network described by `config`, open a connection per
/// node, register each node's served addresses, issue the configured sends,
/// and let the protocol run to completion before returning.
///
/// Mirrors `examples/mycrl-turn-rs/src/lib.rs`'s `startup(config) ->
/// anyhow::Result<()>` entry point, minus the "run forever" tail: this is a
/// one-shot demo rather than a daemon, so it exits once the scenario settles
/// instead of awaiting `std::future::pending::<()>()`.
pub async fn startup(config: Arc<Config>) -> anyhow::Result<()> {
    let network = Network::new(config.latency());
    let mut connections = Vec::new();

    for node in &config.nodes {
        let address = NodeAddress(node.address);
        let connection = Connection::open(
            address,
            ConnectionOptions::default(),
            Arc::new(network.node(address)),
            Arc::new(network.node(address)),
            LoggingHandler { node: address },
        );

        for &served in &node.serves {
            let served = AnycastAddress::new(served)?;
            connection.listen_on(served).await?;
            log::info!("node {address} listening on anycast address {served}");
        }

        connections.push((address, connection));
    }

    for send in &config.sends {
        let from = NodeAddress(send.from);
        let Some((_, connection)) = connections.iter().find(|(addr, _)| *addr == from) else {
            log::warn!("ignoring send from unknown node {from}");
            continue;
        };

        let address = AnycastAddress::new(send.address)?;
        log::info!("node {from} sending to anycast address {address}: {:?}", send.payload);
        connection.send(address, send.payload.as_bytes()).await?;
    }

    tokio::time::sleep(config.latency() * 8 + Duration::from_millis(50)).await;

    for (_, connection) in &connections {
        connection.close().await;
    }

    Ok(())
}
