//! Retrying UDP send helper shared by every client.

use log::{debug, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone)]
pub struct SendConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub max_packet_size: usize,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            max_packet_size: 65507,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendStats {
    pub total_sends: usize,
    pub successful_sends: usize,
    pub failed_sends: usize,
    pub retries: usize,
    pub timeouts: usize,
    pub bytes_sent: usize,
}

pub struct SafeSocketSender {
    socket: Arc<UdpSocket>,
    config: SendConfig,
    stats: Arc<Mutex<SendStats>>,
}

impl SafeSocketSender {
    pub fn new(socket: Arc<UdpSocket>, config: Option<SendConfig>) -> Self {
        Self { socket, config: config.unwrap_or_default(), stats: Arc::new(Mutex::new(SendStats::default())) }
    }

    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        if data.len() > self.config.max_packet_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("packet size {} exceeds max {}", data.len(), self.config.max_packet_size),
            ));
        }

        self.stats.lock().await.total_sends += 1;

        let mut attempts = 0;
        loop {
            attempts += 1;
            match timeout(self.config.timeout, self.socket.send_to(data, addr)).await {
                Ok(Ok(bytes_sent)) => {
                    let mut stats = self.stats.lock().await;
                    stats.successful_sends += 1;
                    stats.bytes_sent += bytes_sent;
                    stats.retries += attempts - 1;
                    debug!("sent {bytes_sent} bytes to {addr}");
                    return Ok(bytes_sent);
                }
                Ok(Err(e)) if attempts >= self.config.max_retries => {
                    self.stats.lock().await.failed_sends += 1;
                    return Err(e);
                }
                Err(_) if attempts >= self.config.max_retries => {
                    self.stats.lock().await.failed_sends += 1;
                    self.stats.lock().await.timeouts += 1;
                    return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "send timed out"));
                }
                Ok(Err(e)) => warn!("send attempt {attempts} to {addr} failed: {e}, retrying"),
                Err(_) => {
                    self.stats.lock().await.timeouts += 1;
                    warn!("send attempt {attempts} to {addr} timed out, retrying");
                }
            }
            sleep(self.config.retry_delay).await;
        }
    }

    pub async fn get_stats(&self) -> SendStats {
        self.stats.lock().await.clone()
    }
}

pub async fn safe_sock_sendto(socket: Arc<UdpSocket>, data: &[u8], addr: SocketAddr, config: Option<SendConfig>) -> std::io::Result<usize> {
    SafeSocketSender::new(socket, config).send_to(data, addr).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_updates_stats_regardless_of_peer_presence() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let sender = SafeSocketSender::new(socket, None);
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();

        let _ = sender.send_to(b"hello", addr).await;
        let stats = sender.get_stats().await;
        assert_eq!(stats.total_sends, 1);
    }

    #[tokio::test]
    async fn oversized_packet_is_rejected_before_sending() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let mut config = SendConfig::default();
        config.max_packet_size = 4;
        let sender = SafeSocketSender::new(socket, Some(config));
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();

        let result = sender.send_to(b"too long", addr).await;
        assert!(result.is_err());
    }
}
