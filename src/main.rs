use std::sync::Arc;

use anycast_demo::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::load()?);
    simple_logger::init_with_level(config.log.level.as_level())?;

    if config.nodes.is_empty() {
        log::warn!("no nodes configured, nothing to simulate");
        return Ok(());
    }

    anycast_demo::startup(config).await
}
