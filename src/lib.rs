/*!
# WIP: Weather Information Protocol

A UDP-based binary protocol for weather queries, coordinate-to-area-code
resolution, and sensor/disaster reporting, built from a packet codec, a
weather proxy, a location service, a query service, and a report service.

## Architecture

- **Packet layer** (`wip_common_rs::packet`): the 128-bit common header, the
  TLV extension area, and the typed request/response structs built on top.
- **Client layer** (`wip_common_rs::clients`): UDP clients for each service,
  plus a [`wip_common_rs::client::WipClient`] facade bundling all four.
- **Server layer** (`wip_common_rs::servers`, `proxy`, `scheduler`): the
  service implementations and the proxy that fans a client query out across
  them.
- **Utils layer** (`wip_common_rs::utils`): authentication, caching,
  configuration, and logging.

## Quick start

```no_run
use wip_rust::prelude::*;

# fn run() -> wip_rust::wip_common_rs::packet::core::WipResult<()> {
let mut client = WeatherClient::new("127.0.0.1", 4110, false).map_err(wip_rust::wip_common_rs::packet::core::WipError::Io)?;
let response = client.get_weather_simple(130010, true, true, false, false, false, 0)?;
# let _ = response;
# Ok(())
# }
```
*/

pub mod wip_common_rs;

/// Common imports for WIP Rust users.
pub mod prelude {
    pub use crate::wip_common_rs::clients::async_weather_client::AsyncWeatherClient;
    pub use crate::wip_common_rs::clients::location_client::LocationClient;
    pub use crate::wip_common_rs::clients::query_client::QueryClient;
    pub use crate::wip_common_rs::clients::report_client::ReportClient;
    pub use crate::wip_common_rs::clients::weather_client::WeatherClient;

    pub use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
    pub use crate::wip_common_rs::packet::types::location_packet::{LocationRequest, LocationResponse};
    pub use crate::wip_common_rs::packet::types::query_packet::{QueryRequest, QueryResponse};
    pub use crate::wip_common_rs::packet::types::report_packet::{ReportRequest, ReportResponse};

    pub use crate::wip_common_rs::client::WipClient;

    pub use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
    pub use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
    pub use crate::wip_common_rs::packet::core::{Extensions, WipError, WipResult};
    pub use crate::wip_common_rs::utils::auth::WipAuth;
}
