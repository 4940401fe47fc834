//! Node inventory sources.
//!
//! An inventory source lists every node currently known to the cluster along
//! with its addresses. The refresher consumes it once per cycle.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::path::PathBuf;
use tracing::debug;

use crate::error::DnsError;

/// Kind of a node address, mirroring Kubernetes `NodeAddressType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressKind {
    /// `Hostname`
    Hostname,
    /// `InternalIP`
    InternalIp,
    /// `ExternalIP`
    ExternalIp,
    /// `InternalDNS`
    InternalDns,
    /// `ExternalDNS`
    ExternalDns,
    /// Anything else the API server reports.
    Other(String),
}

impl From<&str> for AddressKind {
    fn from(kind: &str) -> Self {
        match kind {
            "Hostname" => Self::Hostname,
            "InternalIP" => Self::InternalIp,
            "ExternalIP" => Self::ExternalIp,
            "InternalDNS" => Self::InternalDns,
            "ExternalDNS" => Self::ExternalDns,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One address reported for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAddress {
    /// Address kind.
    pub kind: AddressKind,
    /// Address value as reported (hostname or textual IP).
    pub address: String,
}

impl ItemAddress {
    /// Convenience constructor.
    pub fn new(kind: AddressKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }
}

/// One node from the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryItem {
    /// Addresses in the order the source reported them.
    pub addresses: Vec<ItemAddress>,
}

impl InventoryItem {
    /// Item with a hostname and an internal IP, the common case.
    pub fn new(hostname: &str, internal_ip: &str) -> Self {
        Self {
            addresses: vec![
                ItemAddress::new(AddressKind::Hostname, hostname),
                ItemAddress::new(AddressKind::InternalIp, internal_ip),
            ],
        }
    }

    /// Last reported hostname, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.last_of(&AddressKind::Hostname)
    }

    /// Last reported internal IP, if any.
    pub fn internal_ip(&self) -> Option<&str> {
        self.last_of(&AddressKind::InternalIp)
    }

    fn last_of(&self, kind: &AddressKind) -> Option<&str> {
        self.addresses
            .iter()
            .rev()
            .find(|a| &a.kind == kind)
            .map(|a| a.address.as_str())
    }
}

impl From<&Node> for InventoryItem {
    fn from(node: &Node) -> Self {
        let addresses = node
            .status
            .as_ref()
            .and_then(|status| status.addresses.as_ref())
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|a| ItemAddress::new(AddressKind::from(a.type_.as_str()), &a.address))
                    .collect()
            })
            .unwrap_or_default();

        Self { addresses }
    }
}

/// Something that can enumerate the cluster's nodes on demand.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// List every node currently known.
    async fn list(&self) -> Result<Vec<InventoryItem>, DnsError>;
}

/// Lists nodes from the Kubernetes API server.
///
/// A fresh client is built from the kubeconfig on every call, so rotated
/// credentials are picked up without a restart.
#[derive(Debug, Clone)]
pub struct KubeNodeSource {
    kubeconfig: PathBuf,
}

impl KubeNodeSource {
    /// Create a source reading credentials from `kubeconfig`.
    pub fn new(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
        }
    }

    async fn client(&self) -> Result<Client, DnsError> {
        let kubeconfig = Kubeconfig::read_from(&self.kubeconfig)?;
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        Ok(Client::try_from(config)?)
    }
}

#[async_trait]
impl InventorySource for KubeNodeSource {
    async fn list(&self) -> Result<Vec<InventoryItem>, DnsError> {
        let client = self.client().await?;
        let nodes: Api<Node> = Api::all(client);
        let list = nodes.list(&ListParams::default()).await?;

        debug!(
            kubeconfig = %self.kubeconfig.display(),
            nodes = list.items.len(),
            "listed nodes"
        );
        Ok(list.items.iter().map(InventoryItem::from).collect())
    }
}
