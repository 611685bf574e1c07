//! Report request/response packets (type 4 / type 5): a sensor pushes a
//! weather observation for its area code and receives an ACK.

use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::{BitFieldError, Extensions, WipResult};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

const TEMPERATURE_OFFSET: i16 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub header: CommonHeader,
    pub weather_code: u16,
    pub temperature: i16,
    pub precipitation_prob: u8,
    pub alerts: Vec<String>,
    pub disasters: Vec<String>,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl ReportRequest {
    pub fn new(packet_id: u16, area_code: u32, weather_code: u16, temperature: i16, precipitation_prob: u8) -> WipResult<Self> {
        if !(0..=100).contains(&precipitation_prob) {
            return Err(BitFieldError::new(format!("precipitation_prob {precipitation_prob} out of range [0, 100]")).into());
        }
        let mut header = CommonHeader::new(packet_id, PacketType::ReportRequest, area_code, now_unix());
        header.weather_flag = true;
        header.temperature_flag = true;
        header.pop_flag = true;
        Ok(Self {
            header,
            weather_code,
            temperature,
            precipitation_prob,
            alerts: Vec::new(),
            disasters: Vec::new(),
            source: None,
            auth_hash: None,
        })
    }

    pub fn with_alerts(mut self, alerts: Vec<String>) -> Self {
        self.header.alert_flag = !alerts.is_empty();
        self.alerts = alerts;
        self
    }

    pub fn with_disasters(mut self, disasters: Vec<String>) -> Self {
        self.header.disaster_flag = !disasters.is_empty();
        self.disasters = disasters;
        self
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
        if header.packet_type != PacketType::ReportRequest {
            return Err(BitFieldError::new("not a report request packet").into());
        }
        if data.len() < 20 {
            return Err(BitFieldError::new(format!("report request needs 20 bytes, got {}", data.len())).into());
        }
        let weather_code = u16::from_le_bytes([data[16], data[17]]);
        let temperature = data[18] as i16 - TEMPERATURE_OFFSET;
        let precipitation_prob = data[19];
        if !(0..=100).contains(&precipitation_prob) {
            return Err(BitFieldError::new(format!("precipitation_prob {precipitation_prob} out of range [0, 100]")).into());
        }
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

#[derive(Debug, Clone, PartialEq)]
pub struct ReportResponse {
    pub header: CommonHeader,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl ReportResponse {
    /// Builds the ACK for `request`, echoing its `source` extension when present.
    pub fn ack_for(request: &ReportRequest) -> Self {
        let mut header = CommonHeader::new(request.header.packet_id, PacketType::ReportResponse, request.header.area_code, now_unix());
        header.ex_flag = request.source.is_some();
        Self { header, source: request.source.clone(), auth_hash: None }
    }

    pub fn enable_auth(&mut self, hash: [u8; 16]) {
        self.header.response_auth = true;
        self.header.ex_flag = true;
        self.auth_hash = Some(hash);
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
        if header.packet_type != PacketType::ReportResponse {
            return Err(BitFieldError::new("not a report response packet").into());
        }
        let ext = if data.len() > 16 { Extensions::decode(&data[16..])? } else { Extensions::default() };
        Ok(Self { header, source: ext.source, auth_hash: ext.auth_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_report_round_trips() {
        let req = ReportRequest::new(5, 130010, 300, -3, 80).unwrap().with_alerts(vec!["flood-watch".into()]);
        let bytes = req.to_bytes();
        let parsed = ReportRequest::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.weather_code, 300);
        assert_eq!(parsed.temperature, -3);
        assert_eq!(parsed.precipitation_prob, 80);
        assert_eq!(parsed.alerts, vec!["flood-watch".to_string()]);
    }

    #[test]
    fn rejects_precipitation_out_of_range() {
        assert!(ReportRequest::new(1, 1, 100, 10, 150).is_err());
    }

    #[test]
    fn ack_echoes_source_when_present() {
        let req = ReportRequest::new(1, 1, 100, 10, 50).unwrap().with_source("10.0.0.2:5000");
        let ack = ReportResponse::ack_for(&req);
        assert_eq!(ack.source.as_deref(), Some("10.0.0.2:5000"));
        let parsed = ReportResponse::from_bytes(&ack.to_bytes()).unwrap();
        assert_eq!(parsed.source.as_deref(), Some("10.0.0.2:5000"));
    }

    #[test]
    fn ack_without_source_has_no_extension_bytes() {
        let req = ReportRequest::new(1, 1, 100, 10, 50).unwrap();
        let ack = ReportResponse::ack_for(&req);
        assert_eq!(ack.to_bytes().len(), 16);
    }
}
