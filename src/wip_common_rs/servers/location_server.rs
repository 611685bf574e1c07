//! Location service: type-0 coordinate packets in, type-1 area-code packets
//! out. The actual polygon lookup is an external spatial index the base spec
//! places out of scope; this module only owns the cache, validation, and
//! wire plumbing around a pluggable [`LocationResolver`].

use async_trait::async_trait;
use log::{debug, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::wip_common_rs::packet::core::header::PacketType;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::location_packet::{LocationRequest, LocationResponse};
use crate::wip_common_rs::servers::base::RequestHandler;
use crate::wip_common_rs::utils::cache::Cache;
use crate::wip_common_rs::utils::config_loader::LocationConfig;

const DEFAULT_CACHE_CAPACITY: usize = 1000;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// `resolve(latitude, longitude) -> area_code | none`. A missing match is
/// not an error: the service responds with `area_code = 0`.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Option<u32>;
}

/// Resolves nothing; every coordinate maps to `area_code = 0`. Useful as a
/// default when no spatial index is wired in yet.
pub struct NullResolver;

#[async_trait]
impl LocationResolver for NullResolver {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Option<u32> {
        None
    }
}

fn cache_key(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.6},{longitude:.6}")
}

pub struct LocationServer {
    resolver: Arc<dyn LocationResolver>,
    cache: Cache<u32>,
    auth: crate::wip_common_rs::utils::config_loader::AuthSettings,
}

impl LocationServer {
    pub fn new(resolver: Arc<dyn LocationResolver>, config: &LocationConfig) -> Self {
        Self {
            resolver,
            cache: Cache::with_options(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY, Duration::from_secs(60)),
            auth: config.auth.clone(),
        }
    }

    async fn resolve_cached(&self, latitude: f64, longitude: f64) -> u32 {
        let key = cache_key(latitude, longitude);
        if let Some(area_code) = self.cache.get(&key) {
            debug!("location cache hit for {key}");
            return area_code;
        }
        let area_code = self.resolver.resolve(latitude, longitude).await.unwrap_or(0);
        self.cache.set(&key, area_code);
        area_code
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
impl RequestHandler for LocationServer {
    async fn handle(&self, data: &[u8], _source: SocketAddr) -> WipResult<Vec<u8>> {
        let request = match LocationRequest::from_bytes(data) {
            Ok(req) => req,
            Err(e) => {
                let packet_id = extract_packet_id(data);
                return Ok(Self::error_packet(packet_id, &e, None));
            }
        };

        if request.header.packet_type != PacketType::LocationRequest {
            return Ok(Self::error_packet(
                request.header.packet_id,
                &WipError::validation("expected a location request packet"),
                request.source.clone(),
            ));
        }

        if self.auth.enabled && self.auth.request_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let valid = match request.auth_hash {
                Some(hash) => crate::wip_common_rs::utils::auth::WipAuth::verify_auth_hash(
                    request.header.packet_id,
                    request.header.timestamp,
                    passphrase,
                    &hash,
                ),
                None => false,
            };
            if !valid {
                warn!("location request {} failed auth", request.header.packet_id);
                return Ok(Self::error_packet(request.header.packet_id, &WipError::auth("missing or invalid auth hash"), request.source.clone()));
            }
        }

        let area_code = self.resolve_cached(request.latitude, request.longitude).await;
        let mut response = LocationResponse::for_request(&request, area_code);

        if self.auth.enabled && self.auth.response_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let hash = crate::wip_common_rs::utils::auth::WipAuth::calculate_auth_hash(response.header.packet_id, response.header.timestamp, passphrase);
            response.enable_auth(hash);
        }

        Ok(response.to_bytes())
    }
}

/// Pulls the 12-bit packet id out of a buffer too malformed to parse as a
/// full header, so even a codec-rejected request gets an error reply with
/// the right id.
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

    struct FixedResolver(Option<u32>);

    #[async_trait]
    impl LocationResolver for FixedResolver {
        async fn resolve(&self, _latitude: f64, _longitude: f64) -> Option<u32> {
            self.0
        }
    }

    fn test_config() -> LocationConfig {
        LocationConfig {
            host: "127.0.0.1".into(),
            port: 4109,
            auth: Default::default(),
        }
    }

    #[tokio::test]
    async fn resolves_known_coordinates() {
        let server = LocationServer::new(Arc::new(FixedResolver(Some(130010))), &test_config());
        let req = LocationRequest::new(1, 35.0, 139.0, true, false, false, false, false, 0).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let resp = LocationResponse::from_bytes(&reply).unwrap();
        assert_eq!(resp.area_code(), 130010);
    }

    #[tokio::test]
    async fn unresolved_coordinates_return_area_code_zero() {
        let server = LocationServer::new(Arc::new(NullResolver), &test_config());
        let req = LocationRequest::new(1, 0.0, 0.0, false, false, false, false, false, 0).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let resp = LocationResponse::from_bytes(&reply).unwrap();
        assert_eq!(resp.area_code(), 0);
    }

    #[tokio::test]
    async fn caches_repeat_lookups() {
        let server = LocationServer::new(Arc::new(FixedResolver(Some(1))), &test_config());
        let req = LocationRequest::new(1, 10.0, 20.0, false, false, false, false, false, 0).unwrap();
        server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        assert!(server.cache.contains_key(&cache_key(10.0, 20.0)));
    }

    #[tokio::test]
    async fn malformed_packet_yields_error_response() {
        let server = LocationServer::new(Arc::new(NullResolver), &test_config());
        let reply = server.handle(&[0u8; 4], "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let err = ErrorResponse::from_bytes(&reply).unwrap();
        assert_eq!(err.error_code, "400");
    }
}
