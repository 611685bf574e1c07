//! Weather proxy entry point: the one public endpoint WIP clients talk to.
//! Binds `WEATHER_SERVER_HOST`/`WEATHER_SERVER_PORT` and relays to the
//! location and query services named by `LOCATION_RESOLVER_*`/
//! `QUERY_SERVER_*`.

use std::error::Error;
use wip_rust::wip_common_rs::proxy::WeatherProxy;
use wip_rust::wip_common_rs::utils::config_loader::{LocationConfig, QueryConfig, WeatherConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    wip_rust::wip_common_rs::utils::logging::init();

    let weather = WeatherConfig::from_env()?;
    let location = LocationConfig::from_env()?;
    let query = QueryConfig::from_env()?;

    let proxy = WeatherProxy::bind(&weather, &location, &query).await?;
    let handle = proxy.stop_handle();

    let shutdown = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        handle.stop();
    });

    proxy.run().await?;
    shutdown.abort();
    Ok(())
}
