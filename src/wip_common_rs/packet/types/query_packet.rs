//! Query request/response packets (type 2 / type 3): fetch weather data for
//! an area code directly from the query service, bypassing the proxy.

use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::{BitFieldError, Extensions, WipResult};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub header: CommonHeader,
    /// `"ip:port"` of the original client, set by the proxy so a response
    /// can be routed back through it. Direct clients of the query service
    /// leave this unset.
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl QueryRequest {
    pub fn new(packet_id: u16, area_code: u32, weather: bool, temperature: bool, pop: bool, alert: bool, disaster: bool, day: u8) -> Self {
        let mut header = CommonHeader::new(packet_id, PacketType::QueryRequest, area_code, now_unix());
        header.weather_flag = weather;
        header.temperature_flag = temperature;
        header.pop_flag = pop;
        header.alert_flag = alert;
        header.disaster_flag = disaster;
        header.day = day & 0x07;
        Self { header, source: None, auth_hash: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.header.ex_flag = true;
        self.source = Some(source.into());
        self
    }

    pub fn enable_auth(&mut self, hash: [u8; 16]) {
        self.header.request_auth = true;
        self.header.ex_flag = true;
        self.auth_hash = Some(hash);
    }

    pub fn area_code(&self) -> u32 {
        self.header.area_code
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        let ext = Extensions { source: self.source.clone(), auth_hash: self.auth_hash, ..Default::default() };
        if !ext.is_empty() {
            out.extend(ext.encode());
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> WipResult<Self> {
        let header = CommonHeader::from_bytes(data)?;
        if header.packet_type != PacketType::QueryRequest {
            return Err(BitFieldError::new("not a query request packet").into());
        }
        let ext = if data.len() > 16 { Extensions::decode(&data[16..])? } else { Extensions::default() };
        Ok(Self { header, source: ext.source, auth_hash: ext.auth_hash })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub header: CommonHeader,
    pub weather_code: u16,
    /// Degrees Celsius; stored on the wire as `celsius + 100` in one byte.
    pub temperature: i16,
    /// Percent, 0..=100.
    pub precipitation_prob: u8,
    pub alerts: Vec<String>,
    pub disasters: Vec<String>,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

const TEMPERATURE_OFFSET: i16 = 100;

impl QueryResponse {
    pub fn for_request(request: &QueryRequest, weather_code: u16, temperature: i16, precipitation_prob: u8, alerts: Vec<String>, disasters: Vec<String>) -> Self {
        let mut header = CommonHeader::new(request.header.packet_id, PacketType::QueryResponse, request.header.area_code, now_unix());
        header.weather_flag = request.header.weather_flag;
        header.temperature_flag = request.header.temperature_flag;
        header.pop_flag = request.header.pop_flag;
        header.alert_flag = request.header.alert_flag && !alerts.is_empty();
        header.disaster_flag = request.header.disaster_flag && !disasters.is_empty();
        header.day = request.header.day;
        header.ex_flag = header.alert_flag || header.disaster_flag || request.source.is_some();
        Self { header, weather_code, temperature, precipitation_prob, alerts, disasters, source: request.source.clone(), auth_hash: None }
    }

    pub fn enable_auth(&mut self, hash: [u8; 16]) {
        self.header.response_auth = true;
        self.header.ex_flag = true;
        self.auth_hash = Some(hash);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        out.push((self.weather_code & 0xFF) as u8);
        out.push((self.weather_code >> 8) as u8);
        out.push(((self.temperature + TEMPERATURE_OFFSET) & 0xFF) as u8);
        out.push(self.precipitation_prob);

        let ext = Extensions {
            alerts: self.alerts.clone(),
            disasters: self.disasters.clone(),
            source: self.source.clone(),
            auth_hash: self.auth_hash,
            ..Default::default()
        };
        out.extend(ext.encode());
        out
    }

    pub fn from_bytes(data: &[u8]) -> WipResult<Self> {
        let header = CommonHeader::from_bytes(data)?;
        if header.packet_type != PacketType::QueryResponse {
            return Err(BitFieldError::new("not a query response packet").into());
        }
        if data.len() < 20 {
            return Err(BitFieldError::new(format!("query response needs 20 bytes, got {}", data.len())).into());
        }
        let weather_code = u16::from_le_bytes([data[16], data[17]]);
        let temperature = data[18] as i16 - TEMPERATURE_OFFSET;
        let precipitation_prob = data[19];
        let ext = if data.len() > 20 { Extensions::decode(&data[20..])? } else { Extensions::default() };
        Ok(Self {
            header,
            weather_code,
            temperature,
            precipitation_prob,
            alerts: ext.alerts,
            disasters: ext.disasters,
            source: ext.source,
            auth_hash: ext.auth_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let req = QueryRequest::new(99, 130010, true, true, true, false, false, 0);
        let bytes = req.to_bytes();
        let parsed = QueryRequest::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.area_code(), 130010);
        assert_eq!(parsed.header.packet_id, 99);
    }

    #[test]
    fn response_round_trips_negative_temperature() {
        let req = QueryRequest::new(1, 1, true, true, false, true, false, 0);
        let resp = QueryResponse::for_request(&req, 200, -15, 40, vec!["heavy-snow".into()], vec![]);
        let bytes = resp.to_bytes();
        let parsed = QueryResponse::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.temperature, -15);
        assert_eq!(parsed.weather_code, 200);
        assert_eq!(parsed.precipitation_prob, 40);
        assert_eq!(parsed.alerts, vec!["heavy-snow".to_string()]);
    }

    #[test]
    fn alert_flag_drops_when_no_alerts_to_report() {
        let req = QueryRequest::new(1, 1, false, false, false, true, false, 0);
        let resp = QueryResponse::for_request(&req, 100, 20, 0, vec![], vec![]);
        assert!(!resp.header.alert_flag);
    }

    #[test]
    fn rejects_truncated_response() {
        let header = CommonHeader::new(1, PacketType::QueryResponse, 1, 1).to_bytes();
        assert!(QueryResponse::from_bytes(&header).is_err());
    }

    #[test]
    fn source_extension_carries_through_request_and_response() {
        let req = QueryRequest::new(1, 130010, true, false, false, false, false, 0).with_source("198.51.100.4:4110");
        let parsed_req = QueryRequest::from_bytes(&req.to_bytes()).unwrap();
        assert_eq!(parsed_req.source.as_deref(), Some("198.51.100.4:4110"));

        let resp = QueryResponse::for_request(&parsed_req, 100, 20, 0, vec![], vec![]);
        let parsed_resp = QueryResponse::from_bytes(&resp.to_bytes()).unwrap();
        assert_eq!(parsed_resp.source.as_deref(), Some("198.51.100.4:4110"));
    }
}
