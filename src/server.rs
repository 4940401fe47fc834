//! DNS server setup and lifecycle management.

use hickory_server::server::RequestHandler;
use hickory_server::ServerFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::DnsConfig;
use crate::error::DnsError;
use crate::handler::{EndOfChain, NodeDnsHandler};
use crate::inventory::{InventorySource, KubeNodeSource};
use crate::printer::{stdout_sink, SharedSink};
use crate::refresher::InventoryRefresher;
use crate::resolver::QueryResolver;
use crate::table::AddressTable;
use crate::zone::Zone;

/// Idle timeout for TCP connections.
const TCP_TIMEOUT: Duration = Duration::from_secs(30);

/// DNS server publishing Kubernetes node addresses.
pub struct DnsServer {
    config: DnsConfig,
    zone: Zone,
    table: AddressTable,
    source: Arc<dyn InventorySource>,
    sink: SharedSink,
}

impl DnsServer {
    /// Create a new DNS server listing nodes with the configured kubeconfig.
    pub fn new(config: DnsConfig) -> Result<Self, DnsError> {
        let source = Arc::new(KubeNodeSource::new(config.kubeconfig.clone()));
        Self::with_source(config, source)
    }

    /// Create a new DNS server backed by an arbitrary inventory source.
    pub fn with_source(
        config: DnsConfig,
        source: Arc<dyn InventorySource>,
    ) -> Result<Self, DnsError> {
        let zone = Zone::new(&config.zone)?;
        Ok(Self {
            config,
            zone,
            table: AddressTable::new(),
            source,
            sink: stdout_sink(),
        })
    }

    /// Write the handler name for each reply to `sink` instead of stdout.
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Get a reference to the address table.
    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    /// The normalized zone.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Handler serving this server's zone; the end of the chain.
    pub fn handler(&self) -> impl RequestHandler {
        let resolver = QueryResolver::new(self.zone.clone(), self.table.clone());
        NodeDnsHandler::<EndOfChain>::terminal(resolver, Arc::clone(&self.sink))
    }

    /// Run the DNS server until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DnsError> {
        info!(
            listen_addr = %self.config.listen_addr,
            zone = %self.zone,
            kubeconfig = %self.config.kubeconfig.display(),
            "Starting k8s-node-dns server"
        );

        let refresher = InventoryRefresher::new(
            Arc::clone(&self.source),
            self.table.clone(),
            self.zone.clone(),
        )
        .with_interval(self.config.refresh_interval());
        let refresh_handle = tokio::spawn(refresher.run(shutdown.clone()));

        let mut server = ServerFuture::new(self.handler());

        // Bind UDP
        let udp_socket = UdpSocket::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS UDP listening");
        server.register_socket(udp_socket);

        // Bind TCP
        let tcp_listener = TcpListener::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS TCP listening");
        server.register_listener(tcp_listener, TCP_TIMEOUT);

        info!(zone = %self.zone, "DNS server ready to serve queries");

        let served = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("DNS server shutdown requested");
                Ok(())
            }
            result = server.block_until_done() => {
                // Listeners are gone; take the refresher down with us.
                shutdown.cancel();
                result
            }
        };

        info!("Waiting for node list refresher to stop...");
        if let Err(e) = refresh_handle.await {
            error!("Node list refresher task failed: {}", e);
        }

        if let Err(e) = served {
            error!("DNS server error: {}", e);
            return Err(e.into());
        }

        info!("DNS server stopped");
        Ok(())
    }
}
