//! Report service entry point: binds a [`ReportServer`] to
//! `REPORT_SERVER_HOST`/`REPORT_SERVER_PORT`. Persists accepted reports to
//! Redis at `report:<area_code>` when `WIP_REDIS_URL` is set; runs without
//! persistence otherwise.

use log::warn;
use std::error::Error;
use wip_rust::wip_common_rs::servers::{BaseUdpServer, RedisPool, ReportServer};
use wip_rust::wip_common_rs::utils::config_loader::ReportConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    wip_rust::wip_common_rs::utils::logging::init();

    let config = ReportConfig::from_env()?;
    let bind_addr = config.bind_addr();

    let redis = match std::env::var("WIP_REDIS_URL") {
        Ok(url) => match RedisPool::new(&url, 4).await {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("could not connect to redis at {url:?}, running without persistence: {e}");
                None
            }
        },
        Err(_) => None,
    };

    let handler = ReportServer::new(&config, redis, None);
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
