//! k8s-node-dns - Authoritative A/AAAA records for Kubernetes node hostnames.
//!
//! This crate answers DNS queries for `<node>.<zone>.` from an in-memory table
//! of node addresses. The table is rebuilt from the Kubernetes node list on a
//! fixed interval and swapped in whole, so lookups never wait on the API server
//! and never see a half-built table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         k8s-node-dns                            │
//! │                                                                 │
//! │  ┌──────────────────┐    ┌──────────────────┐                   │
//! │  │ Inventory        │───▶│  Address Table   │                   │
//! │  │ Refresher (60s)  │    │  (generations)   │                   │
//! │  └──────────────────┘    └────────┬─────────┘                   │
//! │         │                         │                             │
//! │         │ list nodes              ▼                             │
//! │         │                ┌──────────────────┐                   │
//! │         ▼                │  Query Resolver  │                   │
//! │  ┌──────────────────┐    └────────┬─────────┘                   │
//! │  │ Kubernetes API   │             ▼                             │
//! │  └──────────────────┘    ┌──────────────────┐                   │
//! │                          │ NodeDnsHandler   │◀── UDP/TCP :53    │
//! │                          │  └─▶ next handler│                   │
//! │                          └──────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## DNS Resolution
//!
//! ```text
//! node1.cluster.local.  (A or AAAA)
//!   → in zone "cluster.local"? otherwise delegate
//!   → A or AAAA query?         otherwise delegate
//!   → node1.cluster.local. in table? otherwise delegate
//!   → one record, A or AAAA by the stored address family, TTL 60
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use k8s_node_dns::{DnsConfig, DnsServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = DnsConfig::new("cluster.local");
//!     let shutdown = CancellationToken::new();
//!
//!     let server = DnsServer::new(config).unwrap();
//!     server.run(shutdown).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handler;
pub mod inventory;
pub mod metrics;
pub mod printer;
pub mod refresher;
pub mod resolver;
pub mod server;
pub mod setup;
pub mod table;
pub mod telemetry;
pub mod zone;

// Re-export main types
pub use config::{Config, DnsConfig, TelemetryConfig};
pub use error::DnsError;
pub use handler::NodeDnsHandler;
pub use inventory::{InventoryItem, InventorySource, KubeNodeSource};
pub use refresher::InventoryRefresher;
pub use resolver::{QueryResolver, Resolution};
pub use server::DnsServer;
pub use table::{AddressRecord, AddressTable};
pub use zone::Zone;
