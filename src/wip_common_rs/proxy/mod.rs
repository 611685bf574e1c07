//! The weather proxy (type 0-3, 7 traffic): the one public-facing endpoint a
//! WIP client talks to. It resolves a location, queries weather for the
//! resulting area code, and relays the answer back, holding no state of its
//! own between hops — each forwarded packet carries a `source` extension
//! that says where the eventual reply belongs.

pub mod router;

use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Notify;

use crate::wip_common_rs::packet::core::WipResult;
use crate::wip_common_rs::utils::config_loader::{LocationConfig, QueryConfig, WeatherConfig};
use router::{route, RouteAction};

const MAX_DATAGRAM_SIZE: usize = 4096;

#[derive(Debug, Default)]
pub struct ProxyStats {
    pub forwarded: AtomicU64,
    pub replied: AtomicU64,
    pub dropped: AtomicU64,
}

/// Clone-able stop switch, mirroring `servers::base::ServerHandle`'s shape
/// for the one server in this crate that can't reuse `BaseUdpServer`.
#[derive(Clone)]
pub struct ProxyHandle {
    stop: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ProxyHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

pub struct WeatherProxy {
    socket: UdpSocket,
    location_addr: SocketAddr,
    query_addr: SocketAddr,
    stats: Arc<ProxyStats>,
    stop: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl WeatherProxy {
    pub async fn bind(listen: &WeatherConfig, location: &LocationConfig, query: &QueryConfig) -> WipResult<Self> {
        let socket = UdpSocket::bind(listen.bind_addr())
            .await
            .map_err(crate::wip_common_rs::packet::core::WipError::Io)?;
        let location_addr = format!("{}:{}", location.host, location.port)
            .parse()
            .map_err(|e| crate::wip_common_rs::packet::core::WipError::validation(format!("invalid location service address: {e}")))?;
        let query_addr = format!("{}:{}", query.host, query.port)
            .parse()
            .map_err(|e| crate::wip_common_rs::packet::core::WipError::validation(format!("invalid query service address: {e}")))?;
        Ok(Self {
            socket,
            location_addr,
            query_addr,
            stats: Arc::new(ProxyStats::default()),
            stop: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn stats(&self) -> Arc<ProxyStats> {
        self.stats.clone()
    }

    pub fn stop_handle(&self) -> ProxyHandle {
        ProxyHandle { stop: self.stop.clone(), notify: self.notify.clone() }
    }

    /// Receives datagrams until stopped. Each one is routed and replied to
    /// inline on the single socket; there is no per-request worker pool
    /// because a route decision is cheap (no cache lookups, no Redis) and
    /// the proxy must not reorder the request/response pair for one peer.
    pub async fn run(self) -> WipResult<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        info!("weather proxy listening on {}", self.socket.local_addr().map_err(crate::wip_common_rs::packet::core::WipError::Io)?);

        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = self.notify.notified() => break,
                result = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match result {
                        Ok(pair) => pair,
                        Err(e) if crate::wip_common_rs::servers::base::is_benign_reset(&e) => continue,
                        Err(e) => {
                            warn!("proxy recv_from failed: {e}");
                            continue;
                        }
                    };
                    self.dispatch(&buf[..len], peer).await;
                }
            }
        }

        debug!("weather proxy shutting down");
        Ok(())
    }

    async fn dispatch(&self, data: &[u8], peer: SocketAddr) {
        match route(data, peer, self.location_addr, self.query_addr) {
            RouteAction::Reply { destination, payload } => {
                self.send(&payload, destination).await;
                if destination == self.location_addr || destination == self.query_addr {
                    self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.replied.fetch_add(1, Ordering::Relaxed);
                }
            }
            RouteAction::Drop { reason } => {
                debug!("dropping datagram from {peer}: {reason}");
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn send(&self, payload: &[u8], destination: SocketAddr) {
        if let Err(e) = self.socket.send_to(payload, destination).await {
            warn!("proxy send_to {destination} failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wip_common_rs::packet::types::location_packet::LocationRequest;

    fn test_configs(location_port: u16, query_port: u16) -> (WeatherConfig, LocationConfig, QueryConfig) {
        (
            WeatherConfig { host: "127.0.0.1".into(), port: 0, auth: Default::default() },
            LocationConfig { host: "127.0.0.1".into(), port: location_port, auth: Default::default() },
            QueryConfig {
                host: "127.0.0.1".into(),
                port: query_port,
                generator_host: "127.0.0.1".into(),
                auth: Default::default(),
                redis_url: "redis://127.0.0.1:6379".into(),
            },
        )
    }

    #[tokio::test]
    async fn forwards_location_request_to_backend_with_source_injected() {
        let backend = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let backend_addr = backend.local_addr().unwrap();
        let (weather, location, query) = test_configs(backend_addr.port(), 1);
        let proxy = WeatherProxy::bind(&weather, &location, &query).await.unwrap();
        let proxy_addr = proxy.local_addr().unwrap();
        let handle = proxy.stop_handle();
        tokio::spawn(proxy.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let req = LocationRequest::new(1, 35.0, 139.0, true, false, false, false, false, 0).unwrap();
        client.send_to(&req.to_bytes(), proxy_addr).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = tokio::time::timeout(std::time::Duration::from_secs(2), backend.recv_from(&mut buf)).await.unwrap().unwrap();
        let forwarded = LocationRequest::from_bytes(&buf[..len]).unwrap();
        assert!(forwarded.source.is_some());

        handle.stop();
    }
}
