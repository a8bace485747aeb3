//! Configuration module for cloudhost.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::mock::MAX_HOSTS;
use crate::store::parse_date;

use chrono::NaiveDate;
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Hosts in each generated snapshot (default: 50, at most `MAX_HOSTS`)
    pub host_count: usize,
    /// Channel summaries in each generated snapshot (default: 10)
    pub channel_count: usize,
    /// Generator seed; unset draws from entropy
    pub seed: Option<u64>,
    /// Simulate per-call response latency (default: true)
    pub latency: bool,
    /// Last date of generated samples; unset follows the current date
    pub window_end: Option<NaiveDate>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            host_count: 50,
            channel_count: 10,
            seed: None,
            latency: true,
            window_end: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CLOUDHOST_HTTP_PORT`: HTTP port (default: 8080)
    /// - `CLOUDHOST_HOST_COUNT`: generated hosts (default: 50)
    /// - `CLOUDHOST_CHANNEL_COUNT`: generated channels (default: 10)
    /// - `CLOUDHOST_SEED`: generator seed (default: unset)
    /// - `CLOUDHOST_LATENCY`: `false`, `0` or `off` disables simulated latency
    /// - `CLOUDHOST_WINDOW_END`: last sample date, `YYYY/MM/DD` (default: today)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(port) = lookup("CLOUDHOST_HTTP_PORT").and_then(|v| v.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(count) = lookup("CLOUDHOST_HOST_COUNT").and_then(|v| v.parse().ok()) {
            cfg.host_count = count;
        }
        if cfg.host_count > MAX_HOSTS {
            tracing::warn!("Host count {} capped at {}", cfg.host_count, MAX_HOSTS);
            cfg.host_count = MAX_HOSTS;
        }

        if let Some(count) = lookup("CLOUDHOST_CHANNEL_COUNT").and_then(|v| v.parse().ok()) {
            cfg.channel_count = count;
        }

        if let Some(seed) = lookup("CLOUDHOST_SEED").and_then(|v| v.parse().ok()) {
            cfg.seed = Some(seed);
        }

        if let Some(end) = lookup("CLOUDHOST_WINDOW_END").and_then(|v| parse_date(&v)) {
            cfg.window_end = Some(end);
        }

        if let Some(latency) = lookup("CLOUDHOST_LATENCY") {
            cfg.latency = !matches!(
                latency.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "off"
            );
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.host_count, 50);
        assert_eq!(cfg.channel_count, 10);
        assert_eq!(cfg.seed, None);
        assert!(cfg.latency);
        assert_eq!(cfg.window_end, None);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CLOUDHOST_HTTP_PORT", "9000"),
            ("CLOUDHOST_HOST_COUNT", "not a number"),
            ("CLOUDHOST_SEED", "42"),
            ("CLOUDHOST_LATENCY", "Off"),
        ]
        .into_iter()
        .collect();

        let cfg = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.http_port, 9000);
        assert_eq!(cfg.host_count, 50);
        assert_eq!(cfg.seed, Some(42));
        assert!(!cfg.latency);
    }

    #[test]
    fn test_window_end_and_host_cap() {
        let vars: HashMap<&str, &str> = [
            ("CLOUDHOST_HOST_COUNT", "99999999999"),
            ("CLOUDHOST_WINDOW_END", "2025/08/31"),
        ]
        .into_iter()
        .collect();

        let cfg = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.host_count, MAX_HOSTS);
        assert_eq!(cfg.window_end, NaiveDate::from_ymd_opt(2025, 8, 31));

        let cfg = ServerConfig::from_lookup(|key| {
            (key == "CLOUDHOST_WINDOW_END").then(|| "someday".to_string())
        });
        assert_eq!(cfg.window_end, None);
    }
}
