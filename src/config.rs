//! Configuration types for k8s-node-dns.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Kubeconfig used when none is given on the command line.
pub const DEFAULT_KUBECONFIG: &str = "/var/lib/kubelet/kubeconfig";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DNS server configuration.
    pub dns: DnsConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// DNS server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Address for DNS server to listen on (UDP and TCP).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Zone the node hostnames live in (e.g., "cluster.local").
    pub zone: String,

    /// Kubeconfig used to list nodes.
    #[serde(default = "default_kubeconfig")]
    pub kubeconfig: PathBuf,

    /// Seconds between node list refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl DnsConfig {
    /// Build a config for `zone` with every other field at its default.
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            listen_addr: default_listen_addr(),
            zone: zone.into(),
            kubeconfig: default_kubeconfig(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }

    /// Refresh period as a `Duration`.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "k8s_node_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0u16; 8], 53))
}

fn default_kubeconfig() -> PathBuf {
    PathBuf::from(DEFAULT_KUBECONFIG)
}

fn default_refresh_interval_secs() -> u64 {
    60
}
