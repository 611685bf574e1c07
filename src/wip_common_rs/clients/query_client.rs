//! Async client for the query service (type 2/3 traffic), with a small
//! in-memory response cache keyed the same way [`super::super::servers::query_server`]
//! keys its Redis documents.

use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
use crate::wip_common_rs::packet::core::header::PacketType;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone)]
pub struct QueryClientConfig {
    pub timeout: Duration,
    pub max_concurrent_queries: usize,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
    pub enable_caching: bool,
    pub cache_ttl: Duration,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_concurrent_queries: 50,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(200),
            enable_caching: true,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct QueryStats {
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub retry_attempts: usize,
    pub timeouts: usize,
}

/// One cache entry per distinct (area, requested-fields, day) combination,
/// matching `query_server`'s own `query:<area>:w<>t<>p<>a<>d<>:d<day>` key.
#[derive(Debug)]
struct ResponseCache {
    entries: RwLock<std::collections::HashMap<String, (QueryResponse, Instant)>>,
    ttl: Duration,
}

impl ResponseCache {
    fn new(ttl: Duration) -> Self {
        Self { entries: RwLock::new(std::collections::HashMap::new()), ttl }
    }

    fn key_for(query: &QueryRequest) -> String {
        format!(
            "query:{}:w{}t{}p{}a{}d{}:d{}",
            query.area_code(),
            query.header.weather_flag as u8,
            query.header.temperature_flag as u8,
            query.header.pop_flag as u8,
            query.header.alert_flag as u8,
            query.header.disaster_flag as u8,
            query.header.day,
        )
    }

    async fn get(&self, query: &QueryRequest) -> Option<QueryResponse> {
        let key = Self::key_for(query);
        let entries = self.entries.read().await;
        entries.get(&key).filter(|(_, stored_at)| stored_at.elapsed() <= self.ttl).map(|(response, _)| response.clone())
    }

    async fn put(&self, query: &QueryRequest, response: QueryResponse) {
        let key = Self::key_for(query);
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(key, (response, Instant::now()));
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() <= ttl);
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
pub trait QueryClient {
    async fn execute_query(&self, query: QueryRequest) -> WipResult<QueryResponse>;
    async fn execute_query_with_cache(&self, query: QueryRequest) -> WipResult<QueryResponse>;
    async fn execute_batch_queries(&self, queries: Vec<QueryRequest>) -> Vec<WipResult<QueryResponse>>;
    fn clear_cache(&self);
    async fn get_stats(&self) -> QueryStats;
}

#[derive(Debug)]
pub struct QueryClientImpl {
    addr: SocketAddr,
    config: QueryClientConfig,
    socket: Arc<UdpSocket>,
    packet_ids: Arc<PacketIdGenerator>,
    cache: Arc<ResponseCache>,
    inflight: Arc<Semaphore>,
    stats: Arc<Mutex<QueryStats>>,
}

impl QueryClientImpl {
    pub async fn new(host: &str, port: u16) -> std::io::Result<Self> {
        Self::with_config(host, port, QueryClientConfig::default()).await
    }

    pub async fn with_config(host: &str, port: u16, config: QueryClientConfig) -> std::io::Result<Self> {
        let resolved_host = if host == "localhost" { "wip.ncc.onl" } else { host };
        let addr = resolve_one(resolved_host, port).await?;
        let socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);

        Ok(Self {
            addr,
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            inflight: Arc::new(Semaphore::new(config.max_concurrent_queries)),
            config,
            socket,
            packet_ids: Arc::new(PacketIdGenerator::new()),
            stats: Arc::new(Mutex::new(QueryStats::default())),
        })
    }

    async fn roundtrip(&self, query: &QueryRequest) -> WipResult<QueryResponse> {
        let data = query.to_bytes();
        let packet_id = query.header.packet_id;

        debug!("sending query with packet id {packet_id} to {}", self.addr);
        self.socket.send_to(&data, self.addr).await.map_err(WipError::Io)?;

        let awaited = timeout(self.config.timeout, async {
            let mut buf = [0u8; 2048];
            loop {
                let (len, _) = self.socket.recv_from(&mut buf).await?;
                let response_data = &buf[..len];
                match matches_expected_id(response_data, packet_id) {
                    Some(true) => return Ok(response_data.to_vec()),
                    Some(false) | None => continue,
                }
            }
        })
        .await;

        let raw = match awaited {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(WipError::Io(e)),
            Err(_) => {
                self.stats.lock().await.timeouts += 1;
                return Err(WipError::Timeout(self.config.timeout));
            }
        };

        if let Some(error) = as_error_response(&raw) {
            return Err(WipError::validation(format!("query service returned error code {}", error.error_code)));
        }

        let response = QueryResponse::from_bytes(&raw)?;
        info!("received query response for packet id {packet_id}");
        Ok(response)
    }

    async fn send_with_retries(&self, mut query: QueryRequest) -> WipResult<QueryResponse> {
        query.header.packet_id = self.packet_ids.next_id();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.roundtrip(&query).await {
                Ok(response) => {
                    if attempt > 1 {
                        self.stats.lock().await.retry_attempts += attempt - 1;
                    }
                    return Ok(response);
                }
                Err(e) if attempt >= self.config.retry_attempts => {
                    self.stats.lock().await.failed_queries += 1;
                    return Err(e);
                }
                Err(e) => {
                    warn!("query attempt {attempt} failed, retrying: {e}");
                    sleep(self.config.retry_delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl QueryClient for QueryClientImpl {
    async fn execute_query(&self, query: QueryRequest) -> WipResult<QueryResponse> {
        let _permit = self.inflight.acquire().await.map_err(|e| WipError::validation(e.to_string()))?;

        self.stats.lock().await.total_queries += 1;
        let response = self.send_with_retries(query).await?;
        self.stats.lock().await.successful_queries += 1;
        Ok(response)
    }

    async fn execute_query_with_cache(&self, query: QueryRequest) -> WipResult<QueryResponse> {
        if self.config.enable_caching {
            if let Some(cached) = self.cache.get(&query).await {
                self.stats.lock().await.cache_hits += 1;
                debug!("cache hit for area {}", query.area_code());
                return Ok(cached);
            }
            self.stats.lock().await.cache_misses += 1;
        }

        let response = self.execute_query(query.clone()).await?;
        if self.config.enable_caching {
            self.cache.put(&query, response.clone()).await;
        }
        Ok(response)
    }

    async fn execute_batch_queries(&self, queries: Vec<QueryRequest>) -> Vec<WipResult<QueryResponse>> {
        let handles: Vec<_> = queries
            .into_iter()
            .map(|query| {
                let client = self.clone();
                tokio::spawn(async move { client.execute_query(query).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| Err(WipError::validation(e.to_string()))));
        }
        results
    }

    fn clear_cache(&self) {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            cache.clear().await;
            info!("query cache cleared");
        });
    }

    async fn get_stats(&self) -> QueryStats {
        self.stats.lock().await.clone()
    }
}

impl Clone for QueryClientImpl {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            config: self.config.clone(),
            socket: self.socket.clone(),
            packet_ids: self.packet_ids.clone(),
            cache: self.cache.clone(),
            inflight: self.inflight.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl QueryClientImpl {
    pub async fn reset_stats(&self) {
        *self.stats.lock().await = QueryStats::default();
    }

    pub async fn get_cache_size(&self) -> usize {
        self.cache.len().await
    }
}

async fn resolve_one(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    lookup_host((host, port))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("DNS resolve failed for {host}:{port}: {e}")))?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("no address found for {host}:{port}")))
}

/// `None` if too short to carry a packet id, otherwise whether it matches.
fn matches_expected_id(data: &[u8], expected: u16) -> Option<bool> {
    if data.len() < 2 {
        return None;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]);
    Some(((raw >> 4) & 0x0FFF) == expected)
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
    fn cache_key_matches_server_scheme() {
        let req = QueryRequest::new(1, 130010, true, true, false, true, false, 2);
        assert_eq!(ResponseCache::key_for(&req), "query:130010:w1t1p0a1d0:d2");
    }

    #[test]
    fn matches_expected_id_handles_short_and_mismatched_data() {
        assert_eq!(matches_expected_id(&[0x00], 1), None);
        assert_eq!(matches_expected_id(&[0x10, 0x00], 1), Some(true));
        assert_eq!(matches_expected_id(&[0x20, 0x00], 1), Some(false));
    }
}
