//! Concrete packet types built on the common header and TLV extension codec.
pub mod error_response;
pub mod location_packet;
pub mod query_packet;
pub mod report_packet;

pub use error_response::ErrorResponse;
pub use location_packet::{LocationRequest, LocationResponse};
pub use query_packet::{QueryRequest, QueryResponse};
pub use report_packet::{ReportRequest, ReportResponse};
