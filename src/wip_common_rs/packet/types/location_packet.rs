//! Location request/response packets (type 0 / type 1): resolve a
//! coordinate pair to the area code that owns it.

use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::{BitFieldError, Extensions, WipResult};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn validate_coordinates(latitude: f64, longitude: f64) -> WipResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(BitFieldError::new(format!("latitude {latitude} out of range [-90, 90]")).into());
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(BitFieldError::new(format!("longitude {longitude} out of range [-180, 180]")).into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRequest {
    pub header: CommonHeader,
    pub latitude: f64,
    pub longitude: f64,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl LocationRequest {
    pub fn new(packet_id: u16, latitude: f64, longitude: f64, weather: bool, temperature: bool, pop: bool, alert: bool, disaster: bool, day: u8) -> WipResult<Self> {
        validate_coordinates(latitude, longitude)?;
        let mut header = CommonHeader::new(packet_id, PacketType::LocationRequest, 0, now_unix());
        header.weather_flag = weather;
        header.temperature_flag = temperature;
        header.pop_flag = pop;
        header.alert_flag = alert;
        header.disaster_flag = disaster;
        header.day = day & 0x07;
        header.ex_flag = true;
        Ok(Self { header, latitude, longitude, source: None, auth_hash: None })
    }

    pub fn enable_auth(&mut self, hash: [u8; 16]) {
        self.header.request_auth = true;
        self.auth_hash = Some(hash);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        let ext = Extensions {
            latitude: Some(self.latitude),
            longitude: Some(self.longitude),
            source: self.source.clone(),
            auth_hash: self.auth_hash,
            ..Default::default()
        };
        out.extend(ext.encode());
        out
    }

    pub fn from_bytes(data: &[u8]) -> WipResult<Self> {
        let header = CommonHeader::from_bytes(data)?;
        if header.packet_type != PacketType::LocationRequest {
            return Err(BitFieldError::new("not a location request packet").into());
        }
        let ext = Extensions::decode(&data[16..])?;
        let latitude = ext
            .latitude
            .ok_or_else(|| BitFieldError::new("location request missing latitude extension"))?;
        let longitude = ext
            .longitude
            .ok_or_else(|| BitFieldError::new("location request missing longitude extension"))?;
        validate_coordinates(latitude, longitude)?;
        Ok(Self { header, latitude, longitude, source: ext.source, auth_hash: ext.auth_hash })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationResponse {
    pub header: CommonHeader,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl LocationResponse {
    /// Builds a response for `request`, echoing its `source` extension only
    /// when the request carried one.
    pub fn for_request(request: &LocationRequest, area_code: u32) -> Self {
        let mut header = CommonHeader::new(request.header.packet_id, PacketType::LocationResponse, area_code, now_unix());
        header.weather_flag = request.header.weather_flag;
        header.temperature_flag = request.header.temperature_flag;
        header.pop_flag = request.header.pop_flag;
        header.alert_flag = request.header.alert_flag;
        header.disaster_flag = request.header.disaster_flag;
        header.day = request.header.day;
        header.ex_flag = request.source.is_some();
        Self { header, source: request.source.clone(), auth_hash: None }
    }

    pub fn enable_auth(&mut self, hash: [u8; 16]) {
        self.header.response_auth = true;
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
        if header.packet_type != PacketType::LocationResponse {
            return Err(BitFieldError::new("not a location response packet").into());
        }
        let ext = if data.len() > 16 { Extensions::decode(&data[16..])? } else { Extensions::default() };
        Ok(Self { header, source: ext.source, auth_hash: ext.auth_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_coordinates() {
        let req = LocationRequest::new(42, 35.681236, 139.767125, true, true, false, false, false, 0).unwrap();
        let bytes = req.to_bytes();
        let parsed = LocationRequest::from_bytes(&bytes).unwrap();
        assert!((parsed.latitude - 35.681236).abs() < 1e-6);
        assert!((parsed.longitude - 139.767125).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(LocationRequest::new(1, 95.0, 0.0, false, false, false, false, false, 0).is_err());
    }

    #[test]
    fn response_echoes_source_only_when_present() {
        let mut req = LocationRequest::new(1, 0.0, 0.0, false, false, false, false, false, 0).unwrap();
        let without_source = LocationResponse::for_request(&req, 130010);
        assert!(without_source.source.is_none());
        assert!(!without_source.header.ex_flag);

        req.source = Some("192.168.1.5:4110".into());
        let with_source = LocationResponse::for_request(&req, 130010);
        assert_eq!(with_source.source.as_deref(), Some("192.168.1.5:4110"));
        assert!(with_source.header.ex_flag);
    }

    #[test]
    fn response_round_trips_area_code() {
        let req = LocationRequest::new(7, 1.0, 2.0, false, false, false, false, false, 0).unwrap();
        let resp = LocationResponse::for_request(&req, 471000);
        let bytes = resp.to_bytes();
        let parsed = LocationResponse::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.area_code(), 471000);
    }
}
