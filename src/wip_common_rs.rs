pub mod client;
pub mod clients;
pub mod packet;
pub mod proxy;
pub mod scheduler;
pub mod servers;
pub mod utils;
