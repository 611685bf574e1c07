pub mod auth;
pub mod cache;
pub mod config_loader;
pub mod logging;
