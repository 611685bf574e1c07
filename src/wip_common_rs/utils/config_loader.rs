//! Per-service configuration: environment variables first, with an optional
//! TOML file overlay for local development, then validated. Mirrors the
//! file-then-env-override-then-validate pipeline every service binary uses.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::wip_common_rs::packet::core::{BitFieldError, WipResult};

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> WipResult<u16> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| BitFieldError::new(format!("{key} must be a valid port number, got {raw:?}")).into()),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> WipResult<bool> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| BitFieldError::new(format!("{key} must be true/false, got {raw:?}")).into()),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    pub enabled: bool,
    pub passphrase: Option<String>,
    pub request_auth_enabled: bool,
    pub response_auth_enabled: bool,
}

impl AuthSettings {
    fn from_env(service_prefix: &str) -> WipResult<Self> {
        let enabled = env_bool(&format!("{service_prefix}_AUTH_ENABLED"), false)?;
        let passphrase = env::var(format!("{service_prefix}_PASSPHRASE")).ok();
        if enabled && passphrase.is_none() {
            return Err(BitFieldError::new(format!("{service_prefix}_AUTH_ENABLED=true requires {service_prefix}_PASSPHRASE")).into());
        }
        Ok(Self {
            enabled,
            passphrase,
            request_auth_enabled: env_bool(&format!("{service_prefix}_REQUEST_AUTH_ENABLED"), enabled)?,
            response_auth_enabled: env_bool(&format!("{service_prefix}_RESPONSE_AUTH_ENABLED"), enabled)?,
        })
    }
}

macro_rules! service_config {
    ($name:ident, $host_var:literal, $port_var:literal, $default_host:literal, $default_port:literal, $auth_prefix:literal) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            pub host: String,
            pub port: u16,
            pub auth: AuthSettings,
        }

        impl $name {
            pub fn from_env() -> WipResult<Self> {
                Ok(Self {
                    host: env_string($host_var, $default_host),
                    port: env_u16($port_var, $default_port)?,
                    auth: AuthSettings::from_env($auth_prefix)?,
                })
            }

            pub fn bind_addr(&self) -> String {
                format!("{}:{}", self.host, self.port)
            }
        }
    };
}

service_config!(WeatherConfig, "WEATHER_SERVER_HOST", "WEATHER_SERVER_PORT", "0.0.0.0", 4110, "WEATHER_SERVER");
service_config!(LocationConfig, "LOCATION_RESOLVER_HOST", "LOCATION_RESOLVER_PORT", "0.0.0.0", 4109, "LOCATION_RESOLVER");
service_config!(ReportConfig, "REPORT_SERVER_HOST", "REPORT_SERVER_PORT", "0.0.0.0", 4112, "REPORT_SERVER");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub host: String,
    pub port: u16,
    pub generator_host: String,
    pub auth: AuthSettings,
    pub redis_url: String,
}

impl QueryConfig {
    pub fn from_env() -> WipResult<Self> {
        Ok(Self {
            host: env_string("QUERY_SERVER_HOST", "0.0.0.0"),
            port: env_u16("QUERY_SERVER_PORT", 4111)?,
            generator_host: env_string("QUERY_GENERATOR_HOST", "0.0.0.0"),
            auth: AuthSettings::from_env("QUERY_SERVER")?,
            redis_url: env_string("WIP_REDIS_URL", "redis://127.0.0.1:6379"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Overlays a TOML document's top-level string keys onto environment
/// variables not already set, so a local `.env`-style file can supply
/// defaults without shadowing an operator's real environment.
pub fn apply_file_overlay(path: &Path) -> WipResult<()> {
    let content = std::fs::read_to_string(path).map_err(|e| BitFieldError::new(format!("failed to read config overlay {path:?}: {e}")))?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| BitFieldError::new(format!("invalid TOML in {path:?}: {e}")))?;
    if let toml::Value::Table(map) = table {
        for (key, value) in map {
            if env::var(&key).is_ok() {
                continue;
            }
            let as_str = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            env::set_var(key, as_str);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn weather_config_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("WEATHER_SERVER_HOST");
        env::remove_var("WEATHER_SERVER_PORT");
        env::remove_var("WEATHER_SERVER_AUTH_ENABLED");
        let cfg = WeatherConfig::from_env().unwrap();
        assert_eq!(cfg.port, 4110);
        assert!(!cfg.auth.enabled);
    }

    #[test]
    fn auth_enabled_without_passphrase_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("REPORT_SERVER_AUTH_ENABLED", "true");
        env::remove_var("REPORT_SERVER_PASSPHRASE");
        let result = ReportConfig::from_env();
        assert!(result.is_err());
        env::remove_var("REPORT_SERVER_AUTH_ENABLED");
    }
}
