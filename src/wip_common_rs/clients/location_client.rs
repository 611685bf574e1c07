use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::location_packet::{LocationRequest, LocationResponse};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct CoordinateBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl CoordinateBounds {
    pub fn world() -> Self {
        Self { min_latitude: -90.0, max_latitude: 90.0, min_longitude: -180.0, max_longitude: 180.0 }
    }

    pub fn japan() -> Self {
        Self { min_latitude: 24.0, max_latitude: 46.0, min_longitude: 123.0, max_longitude: 146.0 }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

#[derive(Debug, Clone)]
pub struct LocationClientConfig {
    pub timeout: Duration,
    pub precision_digits: u8,
    pub bounds: CoordinateBounds,
    pub enable_validation: bool,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl Default for LocationClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            precision_digits: 6,
            bounds: CoordinateBounds::world(),
            enable_validation: true,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedLocationResult {
    pub area_code: u32,
    pub cached_at: Instant,
}

impl CachedLocationResult {
    pub fn new(area_code: u32) -> Self {
        Self { area_code, cached_at: Instant::now() }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

#[async_trait]
pub trait LocationClient {
    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> WipResult<u32>;
    async fn resolve_coordinates_with_precision(&self, latitude: f64, longitude: f64, precision: u8) -> WipResult<u32>;
    async fn batch_resolve(&self, coordinates: Vec<(f64, f64)>) -> Vec<WipResult<u32>>;
    async fn validate_coordinates(&self, latitude: f64, longitude: f64) -> WipResult<()>;
    fn clear_cache(&self);
    fn get_cache_stats(&self) -> HashMap<String, usize>;
}

#[derive(Debug)]
pub struct LocationClientImpl {
    addr: SocketAddr,
    config: LocationClientConfig,
    socket: Arc<UdpSocket>,
    pidg: Arc<PacketIdGenerator>,
    cache: Arc<RwLock<HashMap<String, CachedLocationResult>>>,
    stats: Arc<Mutex<LocationStats>>,
}

#[derive(Debug, Default, Clone)]
pub struct LocationStats {
    pub total_requests: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub validation_errors: usize,
}

impl LocationClientImpl {
    pub async fn new(host: &str, port: u16) -> std::io::Result<Self> {
        Self::with_config(host, port, LocationClientConfig::default()).await
    }

    pub async fn with_config(host: &str, port: u16, config: LocationClientConfig) -> std::io::Result<Self> {
        let resolved_host = if host == "localhost" { "127.0.0.1" } else { host };
        let addr: SocketAddr = format!("{resolved_host}:{port}")
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);

        Ok(Self {
            addr,
            config,
            socket,
            pidg: Arc::new(PacketIdGenerator::new()),
            cache: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(Mutex::new(LocationStats::default())),
        })
    }

    fn normalize_coordinates(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let precision = 10_f64.powi(self.config.precision_digits as i32);
        ((latitude * precision).round() / precision, (longitude * precision).round() / precision)
    }

    fn cache_key(&self, latitude: f64, longitude: f64) -> String {
        let (lat, lon) = self.normalize_coordinates(latitude, longitude);
        format!("{lat}:{lon}")
    }

    async fn get_from_cache(&self, latitude: f64, longitude: f64) -> Option<u32> {
        if !self.config.cache_enabled {
            return None;
        }
        let key = self.cache_key(latitude, longitude);
        let cache = self.cache.read().await;
        if let Some(cached) = cache.get(&key) {
            if !cached.is_expired(self.config.cache_ttl) {
                self.stats.lock().await.cache_hits += 1;
                debug!("cache hit for coordinates ({latitude}, {longitude})");
                return Some(cached.area_code);
            }
        }
        self.stats.lock().await.cache_misses += 1;
        None
    }

    async fn store_in_cache(&self, latitude: f64, longitude: f64, area_code: u32) {
        if !self.config.cache_enabled {
            return;
        }
        let key = self.cache_key(latitude, longitude);
        let mut cache = self.cache.write().await;
        cache.insert(key, CachedLocationResult::new(area_code));
        let ttl = self.config.cache_ttl;
        cache.retain(|_, cached| !cached.is_expired(ttl));
    }

    async fn send_location_request(&self, latitude: f64, longitude: f64) -> WipResult<u32> {
        let packet_id = self.pidg.next_id();
        let request = LocationRequest::new(packet_id, latitude, longitude, false, false, false, false, false, 0)?;
        let data = request.to_bytes();
        debug!("sending location request for ({latitude}, {longitude}) with packet id {packet_id}");

        self.socket.send_to(&data, self.addr).await.map_err(WipError::Io)?;

        let result = timeout(self.config.timeout, async {
            let mut buf = [0u8; 1024];
            loop {
                let (len, _) = self.socket.recv_from(&mut buf).await?;
                let response_data = &buf[..len];
                if response_data.len() < 2 {
                    continue;
                }
                let raw = u16::from_le_bytes([response_data[0], response_data[1]]);
                let response_packet_id = (raw >> 4) & 0x0FFF;
                if response_packet_id != packet_id {
                    continue;
                }
                return LocationResponse::from_bytes(response_data).map(|r| r.area_code());
            }
        })
        .await;

        match result {
            Ok(Ok(area_code)) => {
                info!("received area code {area_code} for coordinates ({latitude}, {longitude})");
                Ok(area_code)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(WipError::Timeout(self.config.timeout)),
        }
    }
}

#[async_trait]
impl LocationClient for LocationClientImpl {
    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> WipResult<u32> {
        self.resolve_coordinates_with_precision(latitude, longitude, self.config.precision_digits).await
    }

    async fn resolve_coordinates_with_precision(&self, latitude: f64, longitude: f64, _precision: u8) -> WipResult<u32> {
        self.stats.lock().await.total_requests += 1;

        if self.config.enable_validation {
            self.validate_coordinates(latitude, longitude).await?;
        }

        if let Some(cached) = self.get_from_cache(latitude, longitude).await {
            return Ok(cached);
        }

        let area_code = self.send_location_request(latitude, longitude).await?;
        self.store_in_cache(latitude, longitude, area_code).await;
        Ok(area_code)
    }

    async fn batch_resolve(&self, coordinates: Vec<(f64, f64)>) -> Vec<WipResult<u32>> {
        let mut results = Vec::with_capacity(coordinates.len());
        for (lat, lon) in coordinates {
            results.push(self.resolve_coordinates(lat, lon).await);
        }
        results
    }

    async fn validate_coordinates(&self, latitude: f64, longitude: f64) -> WipResult<()> {
        if !(-90.0..=90.0).contains(&latitude) {
            self.stats.lock().await.validation_errors += 1;
            return Err(WipError::validation(format!("latitude {latitude} out of range [-90, 90]")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            self.stats.lock().await.validation_errors += 1;
            return Err(WipError::validation(format!("longitude {longitude} out of range [-180, 180]")));
        }
        if !self.config.bounds.contains(latitude, longitude) {
            self.stats.lock().await.validation_errors += 1;
            return Err(WipError::validation(format!(
                "coordinates ({latitude}, {longitude}) are outside allowed bounds"
            )));
        }
        Ok(())
    }

    fn clear_cache(&self) {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            cache.write().await.clear();
            info!("location cache cleared");
        });
    }

    fn get_cache_stats(&self) -> HashMap<String, usize> {
        tokio::runtime::Handle::current().block_on(async {
            let cache = self.cache.read().await;
            let stats = self.stats.lock().await;
            let expired = cache.values().filter(|entry| entry.is_expired(self.config.cache_ttl)).count();
            HashMap::from([
                ("cache_size".to_string(), cache.len()),
                ("expired_entries".to_string(), expired),
                ("cache_hits".to_string(), stats.cache_hits),
                ("cache_misses".to_string(), stats.cache_misses),
            ])
        })
    }
}

impl LocationClientImpl {
    pub async fn get_stats(&self) -> LocationStats {
        self.stats.lock().await.clone()
    }

    pub async fn reset_stats(&self) {
        *self.stats.lock().await = LocationStats::default();
    }

    pub fn set_bounds(&mut self, bounds: CoordinateBounds) {
        self.config.bounds = bounds;
    }

    pub fn set_precision(&mut self, precision: u8) {
        self.config.precision_digits = precision;
    }
}
