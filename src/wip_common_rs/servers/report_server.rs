//! Report service: type-4 sensor/disaster observations in, type-5 ACKs out.
//! Validation runs in a fixed order so the client always learns the first
//! thing wrong with its packet rather than an arbitrary one: size, header,
//! auth, type, area code, numeric ranges.

use async_trait::async_trait;
use log::{debug, warn};
use redis::AsyncCommands;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::wip_common_rs::clients::report_client::{ReportClient, ReportClientImpl};
use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::{Extensions, WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::{ErrorResponse, CODE_VALUE_OUT_OF_RANGE};
use crate::wip_common_rs::packet::types::report_packet::{ReportRequest, ReportResponse};
use crate::wip_common_rs::servers::base::RequestHandler;
use crate::wip_common_rs::servers::redis_pool::RedisPool;
use crate::wip_common_rs::utils::config_loader::{AuthSettings, ReportConfig};

const DEFAULT_MAX_REPORT_SIZE: usize = 4096;
const TEMPERATURE_RANGE: std::ops::RangeInclusive<i16> = -50..=60;
const TIMESTAMP_SKEW_SECS: i64 = 3600;

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

pub struct ReportServer {
    max_report_size: usize,
    auth: AuthSettings,
    redis: Option<RedisPool>,
    forward_client: Option<Arc<ReportClientImpl>>,
}

impl ReportServer {
    pub fn new(config: &ReportConfig, redis: Option<RedisPool>, forward_client: Option<Arc<ReportClientImpl>>) -> Self {
        Self { max_report_size: DEFAULT_MAX_REPORT_SIZE, auth: config.auth.clone(), redis, forward_client }
    }

    pub fn with_max_report_size(mut self, max_report_size: usize) -> Self {
        self.max_report_size = max_report_size;
        self
    }

    fn error_packet(packet_id: u16, error: &WipError, source: Option<String>) -> Vec<u8> {
        let mut resp = ErrorResponse::from_error(packet_id, error);
        if let Some(source) = source {
            resp = resp.with_source(source);
        }
        resp.to_bytes()
    }

    fn range_error(packet_id: u16, message: impl Into<String>, source: Option<String>) -> Vec<u8> {
        warn!("report {packet_id} rejected: {}", message.into());
        let mut resp = ErrorResponse::new(packet_id, CODE_VALUE_OUT_OF_RANGE);
        if let Some(source) = source {
            resp = resp.with_source(source);
        }
        resp.to_bytes()
    }

    async fn persist(&self, request: &ReportRequest) {
        let Some(redis) = &self.redis else { return };
        let payload = serde_json::json!({
            "weather_code": request.weather_code,
            "temperature": request.temperature,
            "precipitation_prob": request.precipitation_prob,
            "warnings": request.alerts,
            "disaster": request.disasters,
            "reported_at": now_unix(),
        });
        let mut conn = redis.checkout().await;
        let key = format!("report:{}", request.header.area_code);
        if let Err(e) = conn.set::<_, _, ()>(&key, payload.to_string()).await {
            warn!("failed to persist report for area {}: {e}", request.header.area_code);
        }
    }

    async fn forward(&self, request: ReportRequest) {
        let Some(client) = &self.forward_client else { return };
        if let Err(e) = client.send_report(request).await {
            warn!("forwarding report to upstream report endpoint failed: {e}");
        }
    }
}

#[async_trait]
impl RequestHandler for ReportServer {
    async fn handle(&self, data: &[u8], _source: SocketAddr) -> WipResult<Vec<u8>> {
        if data.len() > self.max_report_size {
            return Ok(Self::error_packet(
                extract_packet_id(data),
                &WipError::codec(format!("report of {} bytes exceeds max_report_size {}", data.len(), self.max_report_size)),
                None,
            ));
        }

        let header = match CommonHeader::from_bytes(data) {
            Ok(header) => header,
            Err(e) => return Ok(Self::error_packet(extract_packet_id(data), &e, None)),
        };

        let ext = if data.len() > 20 { Extensions::decode(&data[20..]).unwrap_or_default() } else { Extensions::default() };

        if self.auth.enabled && self.auth.request_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let valid = match ext.auth_hash {
                Some(hash) => crate::wip_common_rs::utils::auth::WipAuth::verify_auth_hash(header.packet_id, header.timestamp, passphrase, &hash),
                None => false,
            };
            if !valid {
                return Ok(Self::error_packet(header.packet_id, &WipError::auth("missing or invalid auth hash"), ext.source));
            }
        }

        if header.packet_type != PacketType::ReportRequest {
            return Ok(Self::error_packet(header.packet_id, &WipError::validation("unsupported packet type for the report endpoint"), ext.source));
        }

        let request = match ReportRequest::from_bytes(data) {
            Ok(request) => request,
            Err(e) => return Ok(Self::error_packet(header.packet_id, &e, ext.source)),
        };

        if request.header.area_code == 0 {
            return Ok(Self::error_packet(header.packet_id, &WipError::validation("missing area code"), request.source.clone()));
        }

        if !TEMPERATURE_RANGE.contains(&request.temperature) {
            return Ok(Self::range_error(header.packet_id, format!("temperature {} outside [-50, 60]", request.temperature), request.source.clone()));
        }
        let now = now_unix() as i64;
        let skew = (now - request.header.timestamp as i64).abs();
        if skew > TIMESTAMP_SKEW_SECS {
            return Ok(Self::range_error(header.packet_id, format!("timestamp skew {skew}s exceeds {TIMESTAMP_SKEW_SECS}s"), request.source.clone()));
        }

        debug!("accepted report for area {} (packet {})", request.header.area_code, header.packet_id);
        self.persist(&request).await;
        self.forward(request.clone()).await;

        let mut ack = ReportResponse::ack_for(&request);
        if self.auth.enabled && self.auth.response_auth_enabled {
            let passphrase = self.auth.passphrase.as_deref().unwrap_or_default();
            let hash = crate::wip_common_rs::utils::auth::WipAuth::calculate_auth_hash(ack.header.packet_id, ack.header.timestamp, passphrase);
            ack.enable_auth(hash);
        }
        Ok(ack.to_bytes())
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

    fn test_config() -> ReportConfig {
        ReportConfig { host: "127.0.0.1".into(), port: 4112, auth: Default::default() }
    }

    #[tokio::test]
    async fn accepts_valid_report_and_returns_ack() {
        let server = ReportServer::new(&test_config(), None, None);
        let req = ReportRequest::new(1, 130010, 200, 15, 40).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let ack = ReportResponse::from_bytes(&reply).unwrap();
        assert_eq!(ack.header.packet_id, 1);
    }

    #[tokio::test]
    async fn rejects_oversized_report() {
        let server = ReportServer::new(&test_config(), None, None).with_max_report_size(16);
        let req = ReportRequest::new(1, 130010, 200, 15, 40).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let err = ErrorResponse::from_bytes(&reply).unwrap();
        assert_eq!(err.error_code, "413");
    }

    #[tokio::test]
    async fn rejects_zero_area_code() {
        let server = ReportServer::new(&test_config(), None, None);
        let req = ReportRequest::new(1, 0, 200, 15, 40).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let err = ErrorResponse::from_bytes(&reply).unwrap();
        assert_eq!(err.error_code, "402");
    }

    #[tokio::test]
    async fn rejects_out_of_range_temperature() {
        let server = ReportServer::new(&test_config(), None, None);
        let req = ReportRequest::new(1, 130010, 200, 90, 40).unwrap();
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let err = ErrorResponse::from_bytes(&reply).unwrap();
        assert_eq!(err.error_code, CODE_VALUE_OUT_OF_RANGE);
    }

    #[tokio::test]
    async fn ack_echoes_source_when_report_carried_one() {
        let server = ReportServer::new(&test_config(), None, None);
        let req = ReportRequest::new(1, 130010, 200, 15, 40).unwrap().with_source("10.0.0.9:5000");
        let reply = server.handle(&req.to_bytes(), "127.0.0.1:1".parse().unwrap()).await.unwrap();
        let ack = ReportResponse::from_bytes(&reply).unwrap();
        assert_eq!(ack.source.as_deref(), Some("10.0.0.9:5000"));
    }
}
