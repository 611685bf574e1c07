pub mod base;
pub mod location_server;
pub mod query_server;
pub mod redis_pool;
pub mod report_server;

pub use base::{is_benign_reset, BaseUdpServer, RequestHandler, ServerHandle, ServerStats, ServerStatsSnapshot};
pub use location_server::{LocationResolver, LocationServer, NullResolver};
pub use query_server::QueryServer;
pub use redis_pool::RedisPool;
pub use report_server::ReportServer;
