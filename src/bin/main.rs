//! k8s-node-dns binary entry point.

use clap::Parser;
use k8s_node_dns::setup::{self, SetupArgs};
use k8s_node_dns::{telemetry, DnsServer};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SetupArgs::parse();

    // Load configuration
    let config = setup::load(&args)?;

    // Initialize telemetry
    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        config_file = ?args.config,
        listen_addr = %config.dns.listen_addr,
        zone = %config.dns.zone,
        kubeconfig = %config.dns.kubeconfig.display(),
        "Starting k8s-node-dns"
    );

    // Setup graceful shutdown
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    // Run DNS server
    let server = DnsServer::new(config.dns)?;
    server.run(shutdown).await?;

    info!("k8s-node-dns shutdown complete");
    Ok(())
}
