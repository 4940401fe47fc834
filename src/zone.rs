//! The DNS zone node hostnames are published under.

use std::fmt;

use crate::error::DnsError;

/// A normalized zone suffix such as `cluster.local`.
///
/// Stored lower-case without a trailing dot; [`Zone::fqdn`] adds the dot back
/// for matching against fully-qualified query names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    name: String,
    fqdn: String,
}

impl Zone {
    /// Normalize `name` into a zone. Fails on an empty name.
    pub fn new(name: &str) -> Result<Self, DnsError> {
        let name = name.trim().trim_end_matches('.').to_ascii_lowercase();
        if name.is_empty() {
            return Err(DnsError::Config("zone must not be empty".to_string()));
        }
        let fqdn = format!("{}.", name);
        Ok(Self { name, fqdn })
    }

    /// Zone name without the trailing dot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone name with the trailing dot.
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Whether a fully-qualified query name falls inside this zone.
    ///
    /// Plain suffix test, case-sensitive against the normalized zone.
    pub fn contains(&self, qname: &str) -> bool {
        qname.ends_with(&self.fqdn)
    }

    /// Qualify a node hostname into this zone.
    ///
    /// Any domain already present on the hostname is dropped, so both `node1`
    /// and `node1.example.com` become `node1.<zone>.`. Returns `None` when the
    /// first label is empty.
    pub fn qualify(&self, hostname: &str) -> Option<String> {
        let short = hostname.split('.').next().unwrap_or(hostname);
        if short.is_empty() {
            return None;
        }
        Some(format!("{}.{}", short.to_ascii_lowercase(), self.fqdn))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
