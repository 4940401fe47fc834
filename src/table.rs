//! In-memory address table backed by periodic node list refreshes.
//!
//! The table is a sequence of immutable generations. Readers look names up
//! in whichever generation is current; the refresher builds the next one off
//! to the side and swaps it in whole, so a reader never sees a mix of two.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;
use tracing::debug;

use crate::metrics;

/// An address published for one hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRecord {
    address: IpAddr,
    is_ipv6: bool,
}

impl AddressRecord {
    /// Classify `address` by family.
    ///
    /// IPv4-mapped IPv6 addresses have a valid 4-byte form and are stored as
    /// IPv4.
    pub fn new(address: IpAddr) -> Self {
        let address = address.to_canonical();
        Self {
            address,
            is_ipv6: address.is_ipv6(),
        }
    }

    /// Record for a node that has no usable address (`::`).
    pub fn unspecified() -> Self {
        Self::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED))
    }

    /// The stored address.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Whether the stored address is IPv6.
    pub fn is_ipv6(&self) -> bool {
        self.is_ipv6
    }
}

impl From<IpAddr> for AddressRecord {
    fn from(address: IpAddr) -> Self {
        Self::new(address)
    }
}

/// One complete, atomically installed version of the table.
#[derive(Debug, Default)]
pub struct Generation {
    serial: u64,
    entries: HashMap<String, AddressRecord>,
}

impl Generation {
    /// Generation number; 0 is the empty table present at startup.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Look up a fully-qualified hostname in this generation.
    pub fn get(&self, name: &str) -> Option<AddressRecord> {
        self.entries.get(name).copied()
    }

    /// All entries of this generation.
    pub fn entries(&self) -> &HashMap<String, AddressRecord> {
        &self.entries
    }

    /// Number of hostnames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the generation has no hostnames.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe hostname to address table.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    current: Arc<RwLock<Arc<Generation>>>,
}

impl AddressTable {
    /// Create an empty table (generation 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fully-qualified hostname.
    pub fn lookup(&self, name: &str) -> Option<AddressRecord> {
        self.current.read().get(name)
    }

    /// Install `entries` as the entire visible contents, discarding the previous
    /// generation. Returns the new generation number.
    pub fn replace(&self, entries: HashMap<String, AddressRecord>) -> u64 {
        let count = entries.len();
        let (previous, serial) = {
            let mut current = self.current.write();
            let serial = current.serial.wrapping_add(1);
            let next = Arc::new(Generation { serial, entries });
            (std::mem::replace(&mut *current, next), serial)
        };
        // Old generation is freed here, outside the lock, unless a snapshot
        // still holds it.
        drop(previous);

        debug!(generation = serial, entries = count, "installed address table");
        metrics::record_table_state(count, serial);
        serial
    }

    /// The current generation, consistent as a whole.
    pub fn snapshot(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    /// Current generation number.
    pub fn generation(&self) -> u64 {
        self.current.read().serial
    }

    /// Number of hostnames in the current generation.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Whether the current generation is empty.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}
