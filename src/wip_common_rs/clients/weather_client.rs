//! Synchronous weather client: sends a `QueryRequest` and blocks for the
//! matching `QueryResponse`. This is the client behind the `wip-weather` CLI.

use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
use crate::wip_common_rs::clients::utils::receive_with_id::{receive_with_id, ReceiveConfig};
use crate::wip_common_rs::packet::core::WipResult;
use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};
use crate::wip_common_rs::utils::auth::WipAuth;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

#[derive(Debug)]
pub struct WeatherClient {
    pub host: String,
    pub port: u16,
    addr: SocketAddr,
    socket: UdpSocket,
    pub debug: bool,
    pidg: PacketIdGenerator,
    auth_enabled: bool,
    auth_passphrase: String,
    response_auth_enabled: bool,
}

impl WeatherClient {
    pub fn new(host: &str, port: u16, debug: bool) -> io::Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "invalid address"))?;

        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_read_timeout(Some(Duration::from_secs(10)))?;

        let auth_enabled = std::env::var("WEATHER_SERVER_REQUEST_AUTH_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let auth_passphrase = std::env::var("WEATHER_SERVER_PASSPHRASE").unwrap_or_default();
        let response_auth_enabled = std::env::var("WEATHER_SERVER_RESPONSE_AUTH_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            host: host.to_string(),
            port,
            addr,
            socket,
            debug,
            pidg: PacketIdGenerator::new(),
            auth_enabled,
            auth_passphrase,
            response_auth_enabled,
        })
    }

    pub fn send_raw(&self, data: &[u8], expected_id: u16) -> io::Result<Vec<u8>> {
        self.socket.send_to(data, self.addr)?;
        receive_with_id(&self.socket, expected_id, Some(ReceiveConfig::default()))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn get_weather_simple(
        &mut self,
        area_code: u32,
        weather: bool,
        temperature: bool,
        precipitation_prob: bool,
        alert: bool,
        disaster: bool,
        day: u8,
    ) -> WipResult<Option<QueryResponse>> {
        let packet_id = self.pidg.next_id();
        let mut req = QueryRequest::new(
            packet_id,
            area_code,
            weather,
            temperature,
            precipitation_prob,
            alert,
            disaster,
            day,
        );

        if self.auth_enabled && !self.auth_passphrase.is_empty() {
            let timestamp = req.header.timestamp;
            let hash = WipAuth::calculate_auth_hash(packet_id, timestamp, &self.auth_passphrase);
            req.enable_auth(hash);
        }
        if self.response_auth_enabled {
            req.header.response_auth = true;
        }

        let bytes = req.to_bytes();
        let resp_bytes = self.send_raw(&bytes, packet_id)?;
        let response = QueryResponse::from_bytes(&resp_bytes)?;

        if self.verify_response_auth(&response) {
            Ok(Some(response))
        } else {
            if self.debug {
                eprintln!("response authentication verification failed");
            }
            Ok(None)
        }
    }

    pub fn get_weather_data(
        &mut self,
        area_code: u32,
        weather: Option<bool>,
        temperature: Option<bool>,
        precipitation_prob: Option<bool>,
        alert: Option<bool>,
        disaster: Option<bool>,
        day: Option<u8>,
    ) -> WipResult<Option<QueryResponse>> {
        self.get_weather_simple(
            area_code,
            weather.unwrap_or(true),
            temperature.unwrap_or(true),
            precipitation_prob.unwrap_or(true),
            alert.unwrap_or(false),
            disaster.unwrap_or(false),
            day.unwrap_or(0),
        )
    }

    fn verify_response_auth(&self, response: &QueryResponse) -> bool {
        if !self.response_auth_enabled {
            return true;
        }
        if self.auth_passphrase.is_empty() {
            if self.debug {
                eprintln!("response auth enabled but passphrase not set");
            }
            return false;
        }
        if !response.header.response_auth {
            if self.debug {
                eprintln!("response auth flag not set");
            }
            return false;
        }
        match response.auth_hash {
            Some(hash) => WipAuth::verify_auth_hash(
                response.header.packet_id,
                response.header.timestamp,
                &self.auth_passphrase,
                &hash,
            ),
            None => {
                if self.debug {
                    eprintln!("response auth hash missing");
                }
                false
            }
        }
    }
}
