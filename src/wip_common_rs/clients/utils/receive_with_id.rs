//! Blocking receive-until-matching-packet-id, shared by the sync clients
//! that poll a [`std::net::UdpSocket`] directly instead of going through
//! tokio (see [`super::super::weather_client`]).

use log::{debug, warn};
use std::io::{self, ErrorKind};
use std::net::UdpSocket;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ReceiveConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub buffer_size: usize,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), max_retries: 3, buffer_size: 2048 }
    }
}

/// Packet id sits in the low 12 bits of the header's first 2 bytes, above
/// the 4-bit version field (LSB0, little-endian) — see [`super::super::super::packet::core::header`].
fn extract_packet_id(data: &[u8]) -> io::Result<u16> {
    if data.len() < 2 {
        return Err(io::Error::new(ErrorKind::InvalidData, "data too short to contain a packet id"));
    }
    let value = u16::from_le_bytes([data[0], data[1]]);
    Ok((value >> 4) & 0x0FFF)
}

/// Polls `socket` until a datagram with `expected_id` arrives, discarding
/// anything else (a reply to a since-abandoned request, a stray retransmit).
pub fn receive_with_id(socket: &UdpSocket, expected_id: u16, config: Option<ReceiveConfig>) -> io::Result<Vec<u8>> {
    let config = config.unwrap_or_default();
    let start_time = Instant::now();
    let mut buffer = vec![0u8; config.buffer_size];
    let mut retries = 0;

    debug!("waiting for packet with id {expected_id}");

    loop {
        if start_time.elapsed() >= config.timeout {
            return Err(io::Error::new(ErrorKind::TimedOut, format!("timeout waiting for packet id {expected_id}")));
        }

        socket.set_read_timeout(Some(Duration::from_millis(100)))?;

        match socket.recv_from(&mut buffer) {
            Ok((len, src_addr)) => {
                let data = &buffer[..len];
                match extract_packet_id(data) {
                    Ok(packet_id) if packet_id == expected_id => {
                        debug!("received packet with id {packet_id} from {src_addr}");
                        return Ok(data.to_vec());
                    }
                    Ok(packet_id) => {
                        debug!("discarding packet with id {packet_id} from {src_addr} (expected {expected_id})");
                    }
                    Err(e) => warn!("failed to extract packet id: {e}"),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                retries += 1;
                if retries >= config.max_retries {
                    return Err(e);
                }
                warn!("receive error (retry {retries}/{}): {e}", config.max_retries);
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_packet_id_reads_the_12_bits_above_version() {
        let data = vec![0x34, 0x12, 0xFF, 0xAA];
        assert_eq!(extract_packet_id(&data).unwrap(), 0x0123);
    }

    #[test]
    fn extract_packet_id_rejects_short_data() {
        assert!(extract_packet_id(&[0x01]).is_err());
    }

    #[test]
    fn receive_with_id_skips_mismatched_packets() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();

        // packet id 1 (mismatched), then packet id 2 (expected)
        sender.send_to(&[0x10, 0x00], addr).unwrap();
        sender.send_to(&[0x20, 0x00], addr).unwrap();

        let data = receive_with_id(&socket, 2, Some(ReceiveConfig { timeout: Duration::from_secs(2), ..Default::default() })).unwrap();
        assert_eq!(data, vec![0x20, 0x00]);
    }
}
