//! Location service entry point: binds a [`LocationServer`] to
//! `LOCATION_RESOLVER_HOST`/`LOCATION_RESOLVER_PORT` and serves until
//! interrupted.

use std::error::Error;
use std::sync::Arc;
use wip_rust::wip_common_rs::servers::{BaseUdpServer, LocationServer, NullResolver};
use wip_rust::wip_common_rs::utils::config_loader::LocationConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    wip_rust::wip_common_rs::utils::logging::init();

    let config = LocationConfig::from_env()?;
    let bind_addr = config.bind_addr();

    // No spatial index is wired in; every coordinate resolves to area_code 0
    // until a real LocationResolver implementation is plugged in.
    let handler = LocationServer::new(Arc::new(NullResolver), &config);
    let server = BaseUdpServer::bind(&bind_addr, handler, None).await?;
    let handle = server.stop_handle();

    let shutdown = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        handle.stop();
    });

    server.run().await?;
    shutdown.abort();
    Ok(())
}
