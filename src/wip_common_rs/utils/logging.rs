//! Process-wide logging init. Every binary calls [`init`] once at startup;
//! library code never configures a logger itself, it only emits through the
//! `log` macros.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes `env_logger` from `RUST_LOG`, defaulting to `info`.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    });
}
