//! Periodic rebuild of the address table from the node inventory.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DnsError;
use crate::inventory::{InventoryItem, InventorySource};
use crate::metrics::{self, RefreshResult, Timer};
use crate::table::{AddressRecord, AddressTable};
use crate::zone::Zone;

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one successful refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Generation installed by this cycle.
    pub generation: u64,
    /// Hostnames in the new table.
    pub entries: usize,
    /// Inventory items that produced no entry.
    pub skipped: usize,
}

/// Build a complete table from inventory items.
///
/// Items without a usable hostname (missing, or with an empty first label) are
/// skipped. Items without a parsable internal IP get the unspecified address.
/// Returns the entries and the skipped count.
pub fn build_entries(items: &[InventoryItem], zone: &Zone) -> (HashMap<String, AddressRecord>, usize) {
    let mut entries = HashMap::with_capacity(items.len());
    let mut skipped = 0;

    for item in items {
        let name = match item.hostname().and_then(|h| zone.qualify(h)) {
            Some(name) => name,
            None => {
                debug!(?item, "skipping node without usable hostname");
                skipped += 1;
                continue;
            }
        };

        let record = match item.internal_ip().map(str::parse::<IpAddr>) {
            Some(Ok(addr)) => AddressRecord::new(addr),
            Some(Err(_)) | None => {
                warn!(name = %name, "node has no usable internal IP, publishing unspecified address");
                AddressRecord::unspecified()
            }
        };

        entries.insert(name, record);
    }

    (entries, skipped)
}

/// Keeps an [`AddressTable`] in step with an inventory source.
pub struct InventoryRefresher {
    source: Arc<dyn InventorySource>,
    table: AddressTable,
    zone: Zone,
    interval: Duration,
}

impl InventoryRefresher {
    /// Create a refresher writing into `table`.
    pub fn new(source: Arc<dyn InventorySource>, table: AddressTable, zone: Zone) -> Self {
        Self {
            source,
            table,
            zone,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Override the refresh period.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run a single cycle.
    ///
    /// On error the table is left exactly as it was.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, DnsError> {
        let timer = Timer::start();

        let items = match self.source.list().await {
            Ok(items) => items,
            Err(e) => {
                metrics::record_refresh(RefreshResult::Failed, timer.elapsed());
                return Err(e);
            }
        };

        let (entries, skipped) = build_entries(&items, &self.zone);
        let count = entries.len();
        for (name, record) in &entries {
            debug!(name = %name, address = %record.address(), ipv6 = record.is_ipv6(), "node entry");
        }

        let generation = self.table.replace(entries);

        metrics::record_skipped_items(skipped);
        metrics::record_refresh(RefreshResult::Success, timer.elapsed());

        Ok(RefreshOutcome {
            generation,
            entries: count,
            skipped,
        })
    }

    /// Refresh now and then once per interval until `shutdown` is cancelled.
    ///
    /// Failed cycles are logged and not retried early; the next scheduled
    /// cycle is the retry.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            zone = %self.zone,
            interval_secs = self.interval.as_secs(),
            "starting node list refresher"
        );

        loop {
            match self.refresh_once().await {
                Ok(outcome) => info!(
                    generation = outcome.generation,
                    entries = outcome.entries,
                    skipped = outcome.skipped,
                    "refreshed node list"
                ),
                Err(e) => error!("Failed to refresh node list: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => {
                    info!("node list refresher shutting down");
                    return;
                }
            }
        }
    }
}
