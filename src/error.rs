//! Error types for k8s-node-dns.

use thiserror::Error;

/// Errors that can occur in the DNS server.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (network, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Kubernetes API error (client construction or node listing)
    #[error("Kubernetes client error: {0}")]
    Kube(#[from] kube::Error),

    /// Kubeconfig could not be read or turned into a client config
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Layered settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// DNS protocol error
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::ProtoError),

    /// A handler declined a query and nothing follows it in the chain
    #[error("{0}: no next handler found")]
    NoNextHandler(&'static str),
}
