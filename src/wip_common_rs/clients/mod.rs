pub mod async_weather_client;
pub mod location_client;
pub mod query_client;
pub mod report_client;
pub mod utils;
pub mod weather_client;

pub use async_weather_client::{AsyncWeatherClient, ClientConfig, ClientStats, WeatherClientAsync};
pub use location_client::{CoordinateBounds, LocationClient, LocationClientConfig, LocationClientImpl};
pub use query_client::{QueryClient, QueryClientConfig, QueryClientImpl, QueryStats};
pub use report_client::{ReportClient, ReportClientConfig, ReportClientImpl, ReportStats};
pub use weather_client::WeatherClient;
