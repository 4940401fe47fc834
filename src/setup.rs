//! Command-line arguments and layered settings.
//!
//! Settings are resolved in increasing priority:
//!
//! 1. built-in defaults
//! 2. optional TOML file given with `--config`
//! 3. environment variables prefixed `NODE_DNS__` (e.g. `NODE_DNS__DNS__LISTEN_ADDR`)
//! 4. positional arguments: `<zone> [kubeconfig]`

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_KUBECONFIG};
use crate::error::DnsError;
use crate::zone::Zone;

/// Authoritative DNS for Kubernetes node hostnames.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "k8s-node-dns")]
#[command(version, about, long_about = None)]
pub struct SetupArgs {
    /// Zone to answer for (e.g. "cluster.local").
    pub zone: String,

    /// Kubeconfig used to list nodes.
    pub kubeconfig: Option<PathBuf>,

    /// Path to an optional configuration file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SetupArgs {
    /// Parse arguments, reporting any surplus or missing argument as a
    /// configuration error.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, DnsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| DnsError::Config(e.to_string()))
    }
}

/// Resolve the full configuration for `args`.
pub fn load(args: &SetupArgs) -> Result<Config, DnsError> {
    let mut builder = ::config::Config::builder()
        .set_default("dns.listen_addr", "[::]:53")?
        .set_default("dns.kubeconfig", DEFAULT_KUBECONFIG)?
        .set_default("dns.refresh_interval_secs", 60)?;

    if let Some(path) = &args.config {
        builder = builder.add_source(::config::File::from(path.clone()));
    }

    builder = builder
        .add_source(
            ::config::Environment::with_prefix("NODE_DNS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override("dns.zone", args.zone.clone())?;

    if let Some(kubeconfig) = &args.kubeconfig {
        builder = builder.set_override("dns.kubeconfig", kubeconfig.display().to_string())?;
    }

    let config: Config = builder.build()?.try_deserialize()?;

    Zone::new(&config.dns.zone)?;
    if config.dns.refresh_interval_secs == 0 {
        return Err(DnsError::Config(
            "dns.refresh_interval_secs must be positive".to_string(),
        ));
    }

    Ok(config)
}
