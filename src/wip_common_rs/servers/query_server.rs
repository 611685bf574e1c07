//! Query service: type-2 packets in, type-3 fixed/variable field bundles
//! out. Each requested flag is read from the Redis document at
//! `weather:<area_code>` for the request's `day` offset, with an in-process
//! TTL cache in front so a hot area code doesn't hit Redis on every packet.

use async_trait::async_trait;
use log::{debug, warn};
use redis::AsyncCommands;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::wip_common_rs::packet::core::header::PacketType;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};
use crate::wip_common_rs::servers::base::RequestHandler;
use crate::wip_common_rs::servers::redis_pool::RedisPool;
use crate::wip_common_rs::utils::cache::Cache;
use crate::wip_common_rs::utils::config_loader::QueryConfig;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
const DEFAULT_CACHE_CAPACITY: usize = 10_000;
const TEMPERATURE_OFFSET: i16 = 100;

#[derive(Debug, Deserialize, Default)]
struct WeatherDocument {
    #[serde(default)]
    weather: Vec<u16>,
    #[serde(default)]
    temperature: Vec<i16>,
    #[serde(default)]
    precipitation_prob: Vec<u8>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    disaster: Vec<String>,
}

/// The packet-form field bundle: what actually goes on the wire, cached
/// verbatim so a cache hit reproduces a fresh response bit-for-bit.
#[derive(Debug, Clone)]
struct FieldBundle {
    weather_code: u16,
    temperature_packet: u8,
    precipitation_prob: u8,
    alerts: Vec<String>,
    disasters: Vec<String>,
}

fn cache_key(request: &QueryRequest) -> String {
    format!(
        "query:{}:w{}t{}p{}a{}d{}:d{}",
        request.area_code(),
        request.header.weather_flag as u8,
        request.header.temperature_flag as u8,
        request.header.pop_flag as u8,
        request.header.alert_flag as u8,
        request.header.disaster_flag as u8,
        request.header.day,
    )
}

pub struct QueryServer {
    redis: RedisPool,
    cache: Cache<FieldBundle>,
    auth: crate::wip_common_rs::utils::config_loader::AuthSettings,
    refresh_error_count: Arc<AtomicU64>,
}

impl QueryServer {
    pub async fn new(config: &QueryConfig, worker_pool_size: usize) -> WipResult<Self> {
        let redis = RedisPool::new(&config.redis_url, (worker_pool_size * 2).max(2)).await?;
        Ok(Self {
            redis,
            cache: Cache::with_options(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY, Duration::from_secs(60)),
            auth: config.auth.clone(),
            refresh_error_count: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn refresh_error_count(&self) -> u64 {
        self.refresh_error_count.load(Ordering::Relaxed)
    }

    /// The query server's half of a scheduled refresh: rewrite its own
    /// counters on failure. Fetching the upstream feed and writing it into
    /// Redis is outside this crate's scope; callers plug that part in and
    /// only route failures here.
    pub fn note_refresh_failure(&self) {
        self.refresh_error_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn fetch_document(&self, area_code: u32) -> WipResult<Option<WeatherDocument>> {
        let mut conn = self.redis.checkout().await;
        let raw: Option<String> = conn
            .get(format!("weather:{area_code}"))
            .await
            .map_err(|e| WipError::validation(format!("redis GET failed: {e}")))?;
        match raw {
            Some(json) => {
                let doc: WeatherDocument = serde_json::from_str(&json).map_err(|e| WipError::validation(format!("malformed weather document: {e}")))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn fields_from_document(doc: &WeatherDocument, request: &QueryRequest) -> FieldBundle {
        let day = request.header.day as usize;
        let weather_code = if request.header.weather_flag { doc.weather.get(day).copied().unwrap_or(0) } else { 0 };
        let temperature_packet = if request.header.temperature_flag {
            doc.temperature.get(day).map(|c| (*c + TEMPERATURE_OFFSET) as u8).unwrap_or(TEMPERATURE_OFFSET as u8)
        } else {
            TEMPERATURE_OFFSET as u8
        };
        let precipitation_prob = if request.header.pop_flag { doc.precipitation_prob.get(day).copied().unwrap_or(0) } else { 0 };
        let alerts = if request.header.alert_flag { doc.warnings.clone() } else { Vec::new() };
        let disasters = if request.header.disaster_flag { doc.disaster.clone() } else { Vec::new() };
        FieldBundle { weather_code, temperature_packet, precipitation_prob, alerts, disasters }
    }

    async fn resolve_fields(&self, request: &QueryRequest) -> WipResult<FieldBundle> {
        let key = cache_key(request);
        if let Some(bundle) = self.cache.get(&key) {
            debug!("query cache hit for {key}");
            return Ok(bundle);
        }

        let bundle = match self.fetch_document(request.area_code()).await {
            Ok(Some(doc)) => Self::fields_from_document(&doc, request),
            Ok(None) => FieldBundle {
                weather_code: 0,
                temperature_packet: TEMPERATURE_OFFSET as u8,
                precipitation_prob: 0,
                alerts: Vec::new(),
                disasters: Vec::new(),
            },
            Err(e) => {
                warn!("redis fetch failed for area {}: {e}", request.area_code());
                return Err(e);
            }
        };

        self.cache.set(&key, bundle.clone());
        Ok(bundle)
    }

    fn error_packet(packet_id: u16, error: &WipError, source: Option<String>) -> Vec<u8> {
        let mut resp = ErrorResponse::from_error(packet_id, error);
        if let Some(source) = source {
            resp = resp.with_source(source);
        }
        resp.to_bytes()
    }
}

#[async_trait]
impl RequestHandler for QueryServer {
    async fn handle(&self, data: &[u8], _source: SocketAddr) -> WipResult<Vec<u8>> {
        let request = match QueryRequest::from_bytes(data) {
            Ok(req) => req,
            Err(e) => return Ok(Self::error_packet(extract_packet_id(data), &e, None)),
        };

        if request.header.packet_type != PacketType::QueryRequest {
            return Ok(Self::error_packet(request.header.packet_id, &WipError::validation("expected a query request packet"), None));
        }

        if self.auth.enabled && self.auth.request_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let valid = match request.auth_hash {
                Some(hash) => crate::wip_common_rs::utils::auth::WipAuth::verify_auth_hash(request.header.packet_id, request.header.timestamp, passphrase, &hash),
                None => false,
            };
            if !valid {
                return Ok(Self::error_packet(request.header.packet_id, &WipError::auth("missing or invalid auth hash"), None));
            }
        }

        let bundle = match self.resolve_fields(&request).await {
            Ok(bundle) => bundle,
            Err(e) => return Ok(Self::error_packet(request.header.packet_id, &WipError::validation(format!("upstream unavailable: {e}")), None)),
        };

        let mut response = QueryResponse::for_request(
            &request,
            bundle.weather_code,
            bundle.temperature_packet as i16 - TEMPERATURE_OFFSET,
            bundle.precipitation_prob,
            bundle.alerts,
            bundle.disasters,
        );

        if self.auth.enabled && self.auth.response_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let hash = crate::wip_common_rs::utils::auth::WipAuth::calculate_auth_hash(response.header.packet_id, response.header.timestamp, passphrase);
            response.enable_auth(hash);
        }

        Ok(response.to_bytes())
    }
}

fn extract_packet_id(data: &[u8]) -> u16 {
    if data.len() < 2 {
        return 0;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]);
    (raw >> 4) & 0x0FFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_matches_client_scheme() {
        let req = QueryRequest::new(1, 130010, true, true, false, true, false, 2);
        assert_eq!(cache_key(&req), "query:130010:w1t1p0a1d0:d2");
    }

    #[test]
    fn document_fields_respect_flags_and_day_offset() {
        let doc = WeatherDocument {
            weather: vec![100, 200, 300],
            temperature: vec![10, -5, 0],
            precipitation_prob: vec![0, 50, 100],
            warnings: vec!["flood-watch".into()],
            disaster: vec![],
        };
        let req = QueryRequest::new(1, 1, true, true, true, true, false, 1);
        let bundle = QueryServer::fields_from_document(&doc, &req);
        assert_eq!(bundle.weather_code, 200);
        assert_eq!(bundle.temperature_packet as i16 - TEMPERATURE_OFFSET, -5);
        assert_eq!(bundle.precipitation_prob, 50);
        assert_eq!(bundle.alerts, vec!["flood-watch".to_string()]);
        assert!(bundle.disasters.is_empty());
    }

    #[test]
    fn missing_day_in_document_falls_back_to_zero_fields() {
        let doc = WeatherDocument::default();
        let req = QueryRequest::new(1, 1, true, true, true, false, false, 5);
        let bundle = QueryServer::fields_from_document(&doc, &req);
        assert_eq!(bundle.weather_code, 0);
        assert_eq!(bundle.temperature_packet as i16 - TEMPERATURE_OFFSET, 0);
        assert_eq!(bundle.precipitation_prob, 0);
    }
}
