//! Generic UDP request/response server: bind, receive loop, a bounded worker
//! pool, stats behind one lock, graceful shutdown. Every protocol service
//! (location, query, report) plugs in a [`RequestHandler`]; this module owns
//! the socket and the concurrency model so the services only implement
//! parse/validate/construct.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, Notify, Semaphore};

use crate::wip_common_rs::packet::core::WipResult;

/// One handler invocation per datagram. Implementors never touch the socket;
/// they just turn request bytes + the peer address into reply bytes.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, data: &[u8], source: SocketAddr) -> WipResult<Vec<u8>>;

    /// Runs once after the listening socket closes.
    async fn on_shutdown(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ServerStats {
    pub request_count: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ServerStatsSnapshot {
    pub request_count: u64,
    pub error_count: u64,
    pub uptime: Duration,
}

/// Cooperative stop switch handed out by [`BaseUdpServer::stop_handle`]; can
/// be cloned and moved into a signal handler or test harness.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ServerHandle {
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// Returns `true` for the UDP-peer-vanished reset that `recvfrom` can surface
/// after a prior `sendto` to an address that's no longer listening. Treated
/// as a benign no-op rather than a server error, matching the Windows
/// `WSAECONNRESET` behavior the base spec calls out.
pub fn is_benign_reset(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::ConnectionReset
}

fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) * 2
}

pub struct BaseUdpServer<H: RequestHandler> {
    socket: Arc<UdpSocket>,
    handler: Arc<H>,
    pool_size: usize,
    workers: Arc<Semaphore>,
    stats: Arc<Mutex<ServerStats>>,
    started_at: Instant,
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl<H: RequestHandler> BaseUdpServer<H> {
    pub async fn bind(addr: &str, handler: H, worker_pool_size: Option<usize>) -> std::io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let pool_size = worker_pool_size.unwrap_or_else(default_worker_pool_size);
        info!("bound {addr}, worker pool size {pool_size}");
        Ok(Self {
            socket,
            handler: Arc::new(handler),
            pool_size,
            workers: Arc::new(Semaphore::new(pool_size)),
            stats: Arc::new(Mutex::new(ServerStats::default())),
            started_at: Instant::now(),
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn stop_handle(&self) -> ServerHandle {
        ServerHandle { shutdown: self.shutdown.clone(), notify: self.notify.clone() }
    }

    pub async fn stats(&self) -> ServerStatsSnapshot {
        let s = *self.stats.lock().await;
        ServerStatsSnapshot { request_count: s.request_count, error_count: s.error_count, uptime: self.started_at.elapsed() }
    }

    /// Runs the receive loop until a [`ServerHandle`] calls `stop()`. Each
    /// datagram is parsed, handled, and replied to on its own task, gated by
    /// the worker-pool semaphore; shutdown drains in-flight workers by
    /// reacquiring every permit before returning.
    pub async fn run(&self) -> std::io::Result<()> {
        let mut buf = [0u8; 4096];

        while !self.shutdown.load(Ordering::SeqCst) {
            let recv = tokio::select! {
                res = self.socket.recv_from(&mut buf) => res,
                _ = self.notify.notified() => break,
            };

            let (len, source) = match recv {
                Ok(pair) => pair,
                Err(e) if is_benign_reset(&e) => {
                    debug!("benign recvfrom reset from vanished peer: {e}");
                    continue;
                }
                Err(e) => {
                    error!("recvfrom failed: {e}");
                    self.stats.lock().await.error_count += 1;
                    continue;
                }
            };

            let permit = match self.workers.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let data = buf[..len].to_vec();
            let handler = self.handler.clone();
            let socket = self.socket.clone();
            let stats = self.stats.clone();

            tokio::spawn(async move {
                let _permit = permit;
                stats.lock().await.request_count += 1;
                match handler.handle(&data, source).await {
                    Ok(reply) => {
                        if let Err(e) = socket.send_to(&reply, source).await {
                            warn!("sendto {source} failed: {e}");
                        }
                    }
                    Err(e) => {
                        stats.lock().await.error_count += 1;
                        warn!("handler error from {source}: {e}");
                    }
                }
            });
        }

        debug!("shutting down, draining {} in-flight workers", self.pool_size - self.workers.available_permits());
        if let Ok(permit) = self.workers.clone().acquire_many_owned(self.pool_size as u32).await {
            drop(permit);
        }
        self.handler.on_shutdown().await;
        info!("server on {:?} stopped", self.local_addr());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler for EchoHandler {
        async fn handle(&self, data: &[u8], _source: SocketAddr) -> WipResult<Vec<u8>> {
            Ok(data.to_vec())
        }
    }

    #[tokio::test]
    async fn echoes_datagrams_and_counts_requests() {
        let server = BaseUdpServer::bind("127.0.0.1:0", EchoHandler, Some(2)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let handle = server.stop_handle();

        let run = tokio::spawn(async move { server.run().await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"hello", addr).await.unwrap();
        let mut buf = [0u8; 16];
        let (len, _) = timeout(Duration::from_secs(1), client.recv_from(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..len], b"hello");

        handle.stop();
        timeout(Duration::from_secs(1), run).await.unwrap().unwrap().unwrap();
    }

    struct FailingHandler;

    #[async_trait]
    impl RequestHandler for FailingHandler {
        async fn handle(&self, _data: &[u8], _source: SocketAddr) -> WipResult<Vec<u8>> {
            Err(crate::wip_common_rs::packet::core::WipError::validation("boom"))
        }
    }

    #[tokio::test]
    async fn handler_errors_increment_error_count_without_crashing() {
        let server = Arc::new(BaseUdpServer::bind("127.0.0.1:0", FailingHandler, Some(2)).await.unwrap());
        let addr = server.local_addr().unwrap();
        let handle = server.stop_handle();
        let server_clone = server.clone();
        let run = tokio::spawn(async move { server_clone.run().await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"bad", addr).await.unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(server.stats().await.error_count, 1);
        handle.stop();
        timeout(Duration::from_secs(1), run).await.unwrap().unwrap().unwrap();
    }
}
