//! Query service entry point: binds a [`QueryServer`] to
//! `QUERY_SERVER_HOST`/`QUERY_SERVER_PORT` and runs the daily/interval
//! refresh triggers that flag stale Redis documents.

use std::error::Error;
use std::time::Duration;
use wip_rust::wip_common_rs::scheduler::Scheduler;
use wip_rust::wip_common_rs::servers::{BaseUdpServer, QueryServer};
use wip_rust::wip_common_rs::utils::config_loader::QueryConfig;

const REFRESH_INTERVAL: Duration = Duration::from_secs(600);
const DAILY_REFRESH_TIME: &str = "03:00";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    wip_rust::wip_common_rs::utils::logging::init();

    let config = QueryConfig::from_env()?;
    let bind_addr = config.bind_addr();
    let worker_pool_size = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) * 2;

    let handler = std::sync::Arc::new(QueryServer::new(&config, worker_pool_size).await?);

    let mut scheduler = Scheduler::new();
    let daily_handler = handler.clone();
    scheduler.schedule_daily(
        DAILY_REFRESH_TIME,
        std::sync::Arc::new(move || {
            let handler = daily_handler.clone();
            Box::pin(async move {
                // The upstream feed fetch that would populate Redis lives
                // outside this crate; a scheduled trigger without one wired
                // in just counts itself as a failed refresh.
                handler.note_refresh_failure();
            })
        }),
    );
    let interval_handler = handler.clone();
    scheduler.schedule_every(
        REFRESH_INTERVAL,
        std::sync::Arc::new(move || {
            let handler = interval_handler.clone();
            Box::pin(async move {
                handler.note_refresh_failure();
            })
        }),
    );

    let server = BaseUdpServer::bind(&bind_addr, QueryServerHandler(handler), None).await?;
    let handle = server.stop_handle();

    let shutdown = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        handle.stop();
    });

    server.run().await?;
    shutdown.abort();
    scheduler.shutdown().await;
    Ok(())
}

/// Thin wrapper so the shared `Arc<QueryServer>` used by the scheduler above
/// can also be handed to `BaseUdpServer`, which owns its handler by value.
struct QueryServerHandler(std::sync::Arc<QueryServer>);

#[async_trait::async_trait]
impl wip_rust::wip_common_rs::servers::RequestHandler for QueryServerHandler {
    async fn handle(&self, data: &[u8], source: std::net::SocketAddr) -> wip_rust::wip_common_rs::packet::core::WipResult<Vec<u8>> {
        self.0.handle(data, source).await
    }
}
