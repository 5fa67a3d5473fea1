//! Site metadata store

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use xfer_model::{Profiles, SysInfo};

/// Purpose of a grid gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Gateway that accepts transfer jobs
    Transfer,
    /// Gateway that accepts compute jobs
    Compute,
}

/// A grid gateway contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGateway {
    /// Jobs this gateway accepts
    pub kind: GatewayKind,
    /// Contact string, e.g. `host/jobmanager-fork`
    pub contact: String,
}

/// Everything the engine needs to know about one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEntry {
    /// Site handle
    pub handle: String,
    /// Site profiles; the `env` namespace holds the site's environment
    #[serde(default)]
    pub profiles: Profiles,
    /// Gateways, in preference order
    #[serde(default)]
    pub grid_gateways: Vec<GridGateway>,
    /// System descriptor
    #[serde(default)]
    pub sysinfo: SysInfo,
}

impl SiteEntry {
    /// Create a site with no metadata
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            profiles: Profiles::default(),
            grid_gateways: Vec::new(),
            sysinfo: SysInfo::default(),
        }
    }

    /// With an environment variable
    #[inline]
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.profiles.env.insert(key.into(), value.into());
        self
    }

    /// With profiles
    #[inline]
    #[must_use]
    pub fn with_profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = profiles;
        self
    }

    /// With a grid gateway
    #[inline]
    #[must_use]
    pub fn with_gateway(mut self, kind: GatewayKind, contact: impl Into<String>) -> Self {
        self.grid_gateways.push(GridGateway {
            kind,
            contact: contact.into(),
        });
        self
    }

    /// Environment variable value
    #[must_use]
    pub fn environment_variable(&self, key: &str) -> Option<&str> {
        self.profiles.env.get(key).map(String::as_str)
    }

    /// First gateway of the given kind
    #[must_use]
    pub fn gateway(&self, kind: GatewayKind) -> Option<&GridGateway> {
        self.grid_gateways.iter().find(|g| g.kind == kind)
    }
}

/// Read access to site metadata
pub trait SiteStore: Send + Sync + fmt::Debug {
    /// Metadata for `site`, if known
    fn lookup(&self, site: &str) -> Option<SiteEntry>;

    /// One environment variable of `site`
    fn environment_variable(&self, site: &str, key: &str) -> Option<String> {
        self.lookup(site)
            .and_then(|s| s.environment_variable(key).map(str::to_string))
    }
}

/// Site store held in memory
#[derive(Debug, Default)]
pub struct InMemorySiteStore {
    sites: RwLock<HashMap<String, SiteEntry>>,
}

impl InMemorySiteStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `sites`
    #[must_use]
    pub fn from_sites(sites: impl IntoIterator<Item = SiteEntry>) -> Self {
        let store = Self::new();
        for site in sites {
            store.insert(site);
        }
        store
    }

    /// Add or replace a site
    pub fn insert(&self, site: SiteEntry) {
        self.sites.write().insert(site.handle.clone(), site);
    }

    /// Number of known sites
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.read().len()
    }

    /// Whether no site is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.read().is_empty()
    }
}

impl SiteStore for InMemorySiteStore {
    fn lookup(&self, site: &str) -> Option<SiteEntry> {
        self.sites.read().get(site).cloned()
    }
}
