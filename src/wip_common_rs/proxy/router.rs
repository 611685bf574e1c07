//! Pure per-datagram routing decisions. Kept free of sockets and async so
//! the dispatch logic itself — which hop goes where, and what happens to
//! `source` along the way — can be tested without standing up a runtime.

use std::net::SocketAddr;

use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::WipError;
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::location_packet::{LocationRequest, LocationResponse};
use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};

/// What the proxy should do with one datagram. Both forwarding to a backend
/// service and replying to a client end up as `Reply` — the destination
/// address is always known by the time `route` decides on it, whether it
/// came from the proxy's own backend config or from a `source` extension.
pub enum RouteAction {
    /// Send `payload` to `destination` — a backend service or, on the final
    /// hop, a client address recovered from `source`.
    Reply { destination: SocketAddr, payload: Vec<u8> },
    /// Nothing useful to do with this datagram; log and move on.
    Drop { reason: String },
}

fn inject_source(mut request: LocationRequest, peer: SocketAddr) -> LocationRequest {
    request.header.ex_flag = true;
    request.source = Some(peer.to_string());
    request
}

fn parse_source(source: &str) -> Option<SocketAddr> {
    source.parse().ok()
}

/// Decides what to do with one inbound datagram. `peer` is the immediate
/// UDP source (the client for type 0/2/4, a backend service for type 1/3/7).
pub fn route(data: &[u8], peer: SocketAddr, location: SocketAddr, query: SocketAddr) -> RouteAction {
    let header = match CommonHeader::from_bytes(data) {
        Ok(header) => header,
        Err(e) => {
            return RouteAction::Reply { destination: peer, payload: ErrorResponse::from_error(extract_packet_id(data), &e).to_bytes() };
        }
    };

    match header.packet_type {
        PacketType::LocationRequest => route_location_request(data, peer, location, header.packet_id),
        PacketType::LocationResponse => route_location_response(data, query, header.packet_id),
        PacketType::QueryRequest => route_query_request(data, peer, query, header.packet_id),
        PacketType::QueryResponse => route_query_response(data, header.packet_id),
        PacketType::Error => route_error(data, header.packet_id),
        other => RouteAction::Reply {
            destination: peer,
            payload: ErrorResponse::from_error(header.packet_id, &WipError::validation(format!("proxy does not accept packet type {other:?} from a client"))).to_bytes(),
        },
    }
}

fn route_location_request(data: &[u8], peer: SocketAddr, location: SocketAddr, packet_id: u16) -> RouteAction {
    match LocationRequest::from_bytes(data) {
        Ok(request) => RouteAction::Reply { destination: location, payload: inject_source(request, peer).to_bytes() },
        Err(e) => RouteAction::Reply { destination: peer, payload: ErrorResponse::from_error(packet_id, &e).to_bytes() },
    }
}

fn route_location_response(data: &[u8], query: SocketAddr, packet_id: u16) -> RouteAction {
    let response = match LocationResponse::from_bytes(data) {
        Ok(r) => r,
        Err(_) => return RouteAction::Drop { reason: format!("unparseable location response for packet {packet_id}") },
    };
    let Some(source) = response.source.clone() else {
        return RouteAction::Drop { reason: format!("location response for packet {packet_id} missing source extension") };
    };

    let mut query_request = QueryRequest::new(
        response.header.packet_id,
        response.area_code(),
        response.header.weather_flag,
        response.header.temperature_flag,
        response.header.pop_flag,
        response.header.alert_flag,
        response.header.disaster_flag,
        response.header.day,
    )
    .with_source(source);
    query_request.header.ex_flag = true;

    RouteAction::Reply { destination: query, payload: query_request.to_bytes() }
}

fn route_query_request(data: &[u8], peer: SocketAddr, query: SocketAddr, packet_id: u16) -> RouteAction {
    match QueryRequest::from_bytes(data) {
        Ok(mut request) => {
            request.header.ex_flag = true;
            request.source = Some(peer.to_string());
            RouteAction::Reply { destination: query, payload: request.to_bytes() }
        }
        Err(e) => RouteAction::Reply { destination: peer, payload: ErrorResponse::from_error(packet_id, &e).to_bytes() },
    }
}

fn route_query_response(data: &[u8], packet_id: u16) -> RouteAction {
    let mut response = match QueryResponse::from_bytes(data) {
        Ok(r) => r,
        Err(_) => return RouteAction::Drop { reason: format!("unparseable query response for packet {packet_id}") },
    };
    let Some(source) = response.source.take() else {
        return RouteAction::Drop { reason: format!("query response for packet {packet_id} missing source extension") };
    };
    let Some(client_addr) = parse_source(&source) else {
        return RouteAction::Drop { reason: format!("query response for packet {packet_id} has unparseable source {source:?}") };
    };

    response.header.ex_flag = !response.alerts.is_empty() || !response.disasters.is_empty();
    RouteAction::Reply { destination: client_addr, payload: response.to_bytes() }
}

fn route_error(data: &[u8], packet_id: u16) -> RouteAction {
    let error = match ErrorResponse::from_bytes(data) {
        Ok(e) => e,
        Err(_) => return RouteAction::Drop { reason: format!("unparseable error response for packet {packet_id}") },
    };
    match error.source.as_deref().and_then(parse_source) {
        Some(client_addr) => RouteAction::Reply { destination: client_addr, payload: data.to_vec() },
        None => RouteAction::Drop { reason: format!("error response for packet {packet_id} missing source, cannot route to client") },
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

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn type0_request_gains_source_and_forwards_to_location() {
        let req = LocationRequest::new(1, 35.0, 139.0, true, false, false, false, false, 0).unwrap();
        let peer = addr("192.168.1.10:5000");
        match route(&req.to_bytes(), peer, addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Reply { destination, payload } => {
                assert_eq!(destination, addr("127.0.0.1:4109"));
                let forwarded = LocationRequest::from_bytes(&payload).unwrap();
                assert_eq!(forwarded.source.as_deref(), Some("192.168.1.10:5000"));
            }
            _ => panic!("expected a forward"),
        }
    }

    #[test]
    fn type1_response_becomes_type2_request_preserving_flags_and_source() {
        let original = LocationRequest::new(1, 35.0, 139.0, true, true, false, false, false, 2).unwrap();
        let with_source = inject_source(original, addr("10.0.0.5:9999"));
        let location_response = LocationResponse::for_request(&with_source, 130010);

        match route(&location_response.to_bytes(), addr("127.0.0.1:4109"), addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Reply { destination, payload } => {
                assert_eq!(destination, addr("127.0.0.1:4111"));
                let query_request = QueryRequest::from_bytes(&payload).unwrap();
                assert_eq!(query_request.area_code(), 130010);
                assert!(query_request.header.weather_flag);
                assert!(query_request.header.temperature_flag);
                assert_eq!(query_request.header.day, 2);
                assert_eq!(query_request.source.as_deref(), Some("10.0.0.5:9999"));
            }
            _ => panic!("expected a forward"),
        }
    }

    #[test]
    fn type1_response_without_source_is_dropped() {
        let req = LocationRequest::new(1, 0.0, 0.0, false, false, false, false, false, 0).unwrap();
        let response = LocationResponse::for_request(&req, 1);
        match route(&response.to_bytes(), addr("127.0.0.1:4109"), addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Drop { .. } => {}
            _ => panic!("expected a drop"),
        }
    }

    #[test]
    fn type3_response_strips_source_and_replies_to_client() {
        let query_request = QueryRequest::new(7, 130010, true, false, false, true, false, 0).with_source("203.0.113.9:6000");
        let response = QueryResponse::for_request(&query_request, 100, 20, 0, vec!["heavy-rain".into()], vec![]);

        match route(&response.to_bytes(), addr("127.0.0.1:4111"), addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Reply { destination, payload } => {
                assert_eq!(destination, addr("203.0.113.9:6000"));
                let final_response = QueryResponse::from_bytes(&payload).unwrap();
                assert!(final_response.source.is_none());
            }
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn malformed_packet_gets_error_reply_to_peer_not_a_forward() {
        let peer = addr("127.0.0.1:7777");
        match route(&[0u8; 4], peer, addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Reply { destination, payload } => {
                assert_eq!(destination, peer);
                let err = ErrorResponse::from_bytes(&payload).unwrap();
                assert_eq!(err.error_code, "400");
            }
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn error_packet_without_source_is_dropped() {
        let err = ErrorResponse::new(1, "422");
        match route(&err.to_bytes(), addr("127.0.0.1:4111"), addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Drop { .. } => {}
            _ => panic!("expected a drop"),
        }
    }

    #[test]
    fn error_packet_with_source_routes_to_client() {
        let err = ErrorResponse::new(1, "422").with_source("198.51.100.7:4000");
        match route(&err.to_bytes(), addr("127.0.0.1:4111"), addr("127.0.0.1:4109"), addr("127.0.0.1:4111")) {
            RouteAction::Reply { destination, .. } => assert_eq!(destination, addr("198.51.100.7:4000")),
            _ => panic!("expected a reply"),
        }
    }
}
