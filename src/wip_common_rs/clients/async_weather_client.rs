//! High-throughput variant of [`crate::wip_common_rs::clients::query_client`]
//! that spreads outbound sends across a small pool of sockets instead of one,
//! for callers issuing many concurrent queries against the same server.

use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
use crate::wip_common_rs::packet::core::header::PacketType;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub expires_at: Instant,
    pub hit_count: usize,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration) -> Self {
        Self { data, expires_at: Instant::now() + ttl, hit_count: 0 }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    pub fn increment_hit(&mut self) {
        self.hit_count += 1;
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn next_delay(&self, current: Duration) -> Duration {
        let scaled = (current.as_millis() as f64 * self.backoff_multiplier) as u64;
        std::cmp::min(Duration::from_millis(scaled), self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub max_cache_size: usize,
    pub max_concurrent_requests: usize,
    pub retry_config: RetryConfig,
    pub socket_pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
            max_cache_size: 1000,
            max_concurrent_requests: 100,
            retry_config: RetryConfig::default(),
            socket_pool_size: 5,
        }
    }
}

/// Round-robins outbound sends across a fixed set of bound sockets so a burst
/// of concurrent queries isn't serialized on a single socket's send queue.
/// [`super::super::servers::redis_pool::RedisPool`] follows the same shape
/// for pooled Redis connections.
pub struct ConnectionPool {
    sockets: Vec<Arc<UdpSocket>>,
    next: Arc<Mutex<usize>>,
}

impl ConnectionPool {
    pub async fn new(pool_size: usize) -> std::io::Result<Self> {
        let mut sockets = Vec::with_capacity(pool_size.max(1));
        for _ in 0..pool_size.max(1) {
            sockets.push(Arc::new(UdpSocket::bind("0.0.0.0:0").await?));
        }
        Ok(Self { sockets, next: Arc::new(Mutex::new(0)) })
    }

    pub async fn get_socket(&self) -> Arc<UdpSocket> {
        let mut next = self.next.lock().await;
        let socket = self.sockets[*next].clone();
        *next = (*next + 1) % self.sockets.len();
        socket
    }

    pub fn size(&self) -> usize {
        self.sockets.len()
    }
}

#[async_trait]
pub trait AsyncWeatherClient {
    async fn query_async(&self, request: QueryRequest) -> WipResult<QueryResponse>;
    async fn query_with_cache(&self, request: QueryRequest) -> WipResult<QueryResponse>;
    async fn query_batch(&self, requests: Vec<QueryRequest>) -> Vec<WipResult<QueryResponse>>;
    async fn clear_cache(&self);
    fn get_cache_stats(&self) -> HashMap<String, usize>;
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub total_requests: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub retry_attempts: usize,
    pub timeouts: usize,
    pub errors: usize,
}

pub struct WeatherClientAsync {
    addr: SocketAddr,
    config: ClientConfig,
    packet_ids: Arc<PacketIdGenerator>,
    cache: Arc<DashMap<String, CacheEntry<QueryResponse>>>,
    pool: Arc<ConnectionPool>,
    inflight: Arc<Semaphore>,
    stats: Arc<RwLock<ClientStats>>,
}

impl WeatherClientAsync {
    pub async fn new(host: &str, port: u16) -> std::io::Result<Self> {
        Self::with_config(host, port, ClientConfig::default()).await
    }

    pub async fn with_config(host: &str, port: u16, config: ClientConfig) -> std::io::Result<Self> {
        let resolved_host = if host == "localhost" { "127.0.0.1" } else { host };
        let addr: SocketAddr = format!("{resolved_host}:{port}")
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let pool = Arc::new(ConnectionPool::new(config.socket_pool_size).await?);
        let inflight = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            addr,
            packet_ids: Arc::new(PacketIdGenerator::new()),
            cache: Arc::new(DashMap::new()),
            pool,
            inflight,
            stats: Arc::new(RwLock::new(ClientStats::default())),
            config,
        })
    }

    fn cache_key(request: &QueryRequest) -> String {
        format!(
            "{}:w{}t{}p{}a{}d{}:d{}",
            request.area_code(),
            request.header.weather_flag as u8,
            request.header.temperature_flag as u8,
            request.header.pop_flag as u8,
            request.header.alert_flag as u8,
            request.header.disaster_flag as u8,
            request.header.day,
        )
    }

    async fn roundtrip(&self, socket: &UdpSocket, request: &QueryRequest) -> WipResult<QueryResponse> {
        let data = request.to_bytes();
        let packet_id = request.header.packet_id;
        debug!("sending {} bytes to {} via pooled socket", data.len(), self.addr);
        socket.send_to(&data, self.addr).await.map_err(WipError::Io)?;

        let awaited = timeout(self.config.timeout, async {
            let mut buf = [0u8; 2048];
            loop {
                let (len, _) = socket.recv_from(&mut buf).await?;
                let response_data = &buf[..len];
                if matches_expected_id(response_data, packet_id) {
                    return Ok(response_data.to_vec());
                }
            }
        })
        .await;

        let raw = match awaited {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(WipError::Io(e)),
            Err(_) => {
                self.stats.write().await.timeouts += 1;
                return Err(WipError::Timeout(self.config.timeout));
            }
        };

        if let Some(error) = as_error_response(&raw) {
            return Err(WipError::validation(format!("query service returned error code {}", error.error_code)));
        }

        let response = QueryResponse::from_bytes(&raw)?;
        info!("received response for packet id {packet_id}");
        Ok(response)
    }

    async fn send_with_retry(&self, request: &QueryRequest) -> WipResult<QueryResponse> {
        let mut attempts = 0;
        let mut delay = self.config.retry_config.initial_delay;

        loop {
            attempts += 1;
            let socket = self.pool.get_socket().await;
            match self.roundtrip(&socket, request).await {
                Ok(result) => {
                    if attempts > 1 {
                        self.stats.write().await.retry_attempts += attempts - 1;
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if attempts >= self.config.retry_config.max_attempts {
                        self.stats.write().await.errors += 1;
                        return Err(e);
                    }
                    warn!("attempt {attempts} failed, retrying after {delay:?}: {e}");
                    sleep(delay).await;
                    delay = self.config.retry_config.next_delay(delay);
                }
            }
        }
    }

    /// Evicts expired entries, then trims the least-hit quarter if still over
    /// `max_cache_size`.
    async fn evict(&self) {
        let expired: Vec<_> = self.cache.iter().filter(|e| e.value().is_expired()).map(|e| e.key().clone()).collect();
        for key in expired {
            self.cache.remove(&key);
        }

        if self.cache.len() <= self.config.max_cache_size {
            return;
        }

        let mut entries: Vec<_> = self.cache.iter().map(|e| (e.key().clone(), e.value().hit_count)).collect();
        entries.sort_by_key(|(_, hit_count)| *hit_count);
        let remove_count = self.cache.len() - self.config.max_cache_size * 3 / 4;
        for (key, _) in entries.into_iter().take(remove_count) {
            self.cache.remove(&key);
        }
    }
}

#[async_trait]
impl AsyncWeatherClient for WeatherClientAsync {
    async fn query_async(&self, mut request: QueryRequest) -> WipResult<QueryResponse> {
        let _permit = self.inflight.acquire().await.map_err(|e| WipError::validation(e.to_string()))?;
        self.stats.write().await.total_requests += 1;
        request.header.packet_id = self.packet_ids.next_id();
        self.send_with_retry(&request).await
    }

    async fn query_with_cache(&self, request: QueryRequest) -> WipResult<QueryResponse> {
        let cache_key = Self::cache_key(&request);

        if let Some(mut entry) = self.cache.get_mut(&cache_key) {
            if !entry.is_expired() {
                entry.increment_hit();
                self.stats.write().await.cache_hits += 1;
                debug!("cache hit for key: {cache_key}");
                return Ok(entry.data.clone());
            }
        }

        self.stats.write().await.cache_misses += 1;
        debug!("cache miss for key: {cache_key}");

        let response = self.query_async(request).await?;
        self.cache.insert(cache_key, CacheEntry::new(response.clone(), self.config.cache_ttl));
        self.evict().await;
        Ok(response)
    }

    async fn query_batch(&self, requests: Vec<QueryRequest>) -> Vec<WipResult<QueryResponse>> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let client = self.clone();
                tokio::spawn(async move { client.query_with_cache(request).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| Err(WipError::validation(e.to_string()))));
        }
        results
    }

    async fn clear_cache(&self) {
        self.cache.clear();
        info!("cache cleared");
    }

    fn get_cache_stats(&self) -> HashMap<String, usize> {
        let total_hits: usize = self.cache.iter().map(|e| e.value().hit_count).sum();
        HashMap::from([("cache_size".to_string(), self.cache.len()), ("total_cache_hits".to_string(), total_hits)])
    }
}

impl Clone for WeatherClientAsync {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            config: self.config.clone(),
            packet_ids: self.packet_ids.clone(),
            cache: self.cache.clone(),
            pool: self.pool.clone(),
            inflight: self.inflight.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl WeatherClientAsync {
    pub async fn get_stats(&self) -> ClientStats {
        self.stats.read().await.clone()
    }

    pub async fn reset_stats(&self) {
        *self.stats.write().await = ClientStats::default();
    }
}

fn matches_expected_id(data: &[u8], expected: u16) -> bool {
    if data.len() < 2 {
        return false;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]);
    ((raw >> 4) & 0x0FFF) == expected
}

fn as_error_response(data: &[u8]) -> Option<ErrorResponse> {
    if data.len() < 3 {
        return None;
    }
    let packet_type_byte = (data[2] & 0x07).min(7);
    if PacketType::from_u8(packet_type_byte).ok() != Some(PacketType::Error) {
        return None;
    }
    ErrorResponse::from_bytes(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_entry_reports_expiry_and_tracks_hits() {
        let mut entry = CacheEntry::new(42, Duration::from_millis(10));
        assert!(!entry.is_expired());
        entry.increment_hit();
        entry.increment_hit();
        assert_eq!(entry.hit_count, 2);
        std::thread::sleep(Duration::from_millis(20));
        assert!(entry.is_expired());
    }

    #[test]
    fn retry_config_backoff_is_capped_at_max_delay() {
        let config = RetryConfig { max_attempts: 5, initial_delay: Duration::from_millis(100), max_delay: Duration::from_millis(300), backoff_multiplier: 3.0 };
        let first = config.next_delay(config.initial_delay);
        let second = config.next_delay(first);
        assert_eq!(second, config.max_delay);
    }

    #[test]
    fn matches_expected_id_rejects_short_and_mismatched_data() {
        assert!(!matches_expected_id(&[0x00], 1));
        assert!(matches_expected_id(&[0x10, 0x00], 1));
        assert!(!matches_expected_id(&[0x20, 0x00], 1));
    }

    #[tokio::test]
    async fn connection_pool_round_robins_across_sockets() {
        let pool = ConnectionPool::new(3).await.unwrap();
        assert_eq!(pool.size(), 3);
        let first = pool.get_socket().await.local_addr().unwrap();
        let _second = pool.get_socket().await.local_addr().unwrap();
        let _third = pool.get_socket().await.local_addr().unwrap();
        let fourth = pool.get_socket().await.local_addr().unwrap();
        assert_eq!(first, fourth);
    }
}
