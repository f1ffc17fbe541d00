//! Configuration knobs recognised by the `helper` binary (spec §6).
//!
//! `RuntimeConfig` is assembled from a TOML file via the `config` crate, with
//! any field also overridable from the command line (`bin/helper.rs`'s
//! `clap::Parser` struct is merged over it) — the same "file defaults,
//! flags override" shape the teacher's own config loading uses.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::rand_gen_pool::Seeds;

/// Base TCP port; peer offsets follow the fixed localhost scheme in
/// [`PortScheme`].
pub const DEFAULT_PORT: u16 = 10_000;

/// Size of the local worker pool used to parallelise pure-local per-layer
/// computation (spec §5).
pub const DEFAULT_THREADS: usize = 6;

/// Either the localhost three-port scheme or an explicit per-party IP list
/// read from JSON (spec §6 "Network topology").
#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkTopology {
    /// All three parties run on `127.0.0.1`, distinguished only by port.
    Localhost,
    /// `net-config`: a JSON array of three IP strings, index = party id.
    Hosts([String; 3]),
}

/// Derives each ordered pair's TCP port from a base port, for localhost mode.
/// There are three unordered pairs and each party dials out on one of them
/// and listens on the other, so six directed offsets suffice; this scheme
/// numbers them `base + 10*i + j` for the party-`i`-dials-party-`j` leg,
/// which is injective for `i != j` in `{0,1,2}`.
pub struct PortScheme {
    base: u16,
}

impl PortScheme {
    #[must_use]
    pub fn new(base: u16) -> Self {
        PortScheme { base }
    }

    /// The port party `i` listens on for an inbound connection from `j`.
    #[must_use]
    pub fn port_for(&self, listener: u8, dialer: u8) -> u16 {
        self.base + 10 * u16::from(listener) + u16::from(dialer)
    }
}

/// TLS material paths, required together when `tls` is requested.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TlsConfig {
    pub certificate_path: PathBuf,
    pub private_key_path: PathBuf,
    pub trusted_cert_paths: Vec<PathBuf>,
}

/// The full set of knobs a driver must resolve before opening any network
/// connection (spec §6, §7 `ConfigError` — "reported before any network is
/// opened").
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub pid: u8,
    pub threads: usize,
    pub seeds: Seeds,
    pub port: u16,
    pub topology: NetworkTopologyResolved,
    pub tls: Option<TlsConfig>,
}

/// [`NetworkTopology`] after validation: always exactly three addresses,
/// indexed by party id.
#[derive(Debug, Clone)]
pub enum NetworkTopologyResolved {
    Localhost,
    Hosts([String; 3]),
}

impl RuntimeConfig {
    /// Validates the knobs that can be checked without touching the network:
    /// `pid` range, TLS paths present together, seed pairs present. Mirrors
    /// spec §7's `ConfigError` — "missing or conflicting CLI/JSON input;
    /// reported before any network is opened".
    pub fn validate(&self) -> Result<()> {
        if self.pid > 2 {
            return Err(Error::Config(format!("pid must be 0, 1 or 2, got {}", self.pid)));
        }
        if self.threads == 0 {
            return Err(Error::Config("threads must be at least 1".into()));
        }
        if let NetworkTopologyResolved::Hosts(hosts) = &self.topology {
            if hosts.iter().any(String::is_empty) {
                return Err(Error::Config("net-config must list three non-empty host addresses".into()));
            }
        }
        Ok(())
    }
}

/// Parses the three-element host-IP JSON array described by spec §6 into a
/// validated [`NetworkTopologyResolved::Hosts`].
#[cfg(feature = "enable-serde")]
pub fn parse_net_config(json: &str) -> Result<NetworkTopologyResolved> {
    let hosts: [String; 3] = serde_json::from_str(json)?;
    Ok(NetworkTopologyResolved::Hosts(hosts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds() -> Seeds {
        Seeds {
            self_seed: (1, 0),
            all_seed: (2, 2),
            p01_seed: (3, 3),
            p02_seed: (4, 4),
            p12_seed: (5, 5),
        }
    }

    #[test]
    fn port_scheme_is_injective_per_directed_pair() {
        let scheme = PortScheme::new(10_000);
        let mut ports = std::collections::HashSet::new();
        for i in 0..3u8 {
            for j in 0..3u8 {
                if i != j {
                    assert!(ports.insert(scheme.port_for(i, j)));
                }
            }
        }
    }

    #[test]
    fn rejects_out_of_range_pid() {
        let cfg = RuntimeConfig {
            pid: 3,
            threads: 6,
            seeds: seeds(),
            port: DEFAULT_PORT,
            topology: NetworkTopologyResolved::Localhost,
            tls: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_host_in_net_config() {
        let cfg = RuntimeConfig {
            pid: 0,
            threads: 6,
            seeds: seeds(),
            port: DEFAULT_PORT,
            topology: NetworkTopologyResolved::Hosts(["10.0.0.1".into(), String::new(), "10.0.0.3".into()]),
            tls: None,
        };
        assert!(cfg.validate().is_err());
    }
}
