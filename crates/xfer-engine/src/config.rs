//! Transfer configuration
//!
//! [`TransferConfig`] is loaded once at startup from TOML, YAML or JSON and
//! never mutated afterwards. Every field has a default, so an empty file is a
//! valid configuration.

use crate::error::ConfigError;
use crate::registry::ImplementationRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use xfer_model::{JobClass, Profiles};

/// Implementation key selected for each job class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImplementationSelection {
    /// Stage-in jobs
    pub stage_in: String,
    /// Stage-out jobs
    pub stage_out: String,
    /// Inter-site jobs
    pub inter_site: String,
    /// Setup jobs
    pub setup: String,
}

impl Default for ImplementationSelection {
    fn default() -> Self {
        Self {
            stage_in: "transfer".to_string(),
            stage_out: "transfer".to_string(),
            inter_site: "transfer".to_string(),
            setup: "transfer".to_string(),
        }
    }
}

impl ImplementationSelection {
    /// Key selected for `class`
    #[must_use]
    pub fn get(&self, class: JobClass) -> &str {
        match class {
            JobClass::StageIn => &self.stage_in,
            JobClass::StageOut => &self.stage_out,
            JobClass::InterSite => &self.inter_site,
            JobClass::Setup => &self.setup,
        }
    }

    /// Select the same key for every class
    #[must_use]
    pub fn all(key: &str) -> Self {
        Self {
            stage_in: key.to_string(),
            stage_out: key.to_string(),
            inter_site: key.to_string(),
            setup: key.to_string(),
        }
    }
}

/// Process and stream counts for the general-purpose wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Throttle {
    /// Concurrent transfer processes
    pub processes: u32,
    /// Streams per transfer
    pub streams: u32,
    /// Overwrite existing destination files
    pub force: bool,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            processes: 4,
            streams: 1,
            force: false,
        }
    }
}

/// Per-class scheduler priorities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Priorities {
    /// Stage-in jobs
    pub stage_in: Option<i32>,
    /// Stage-out jobs
    pub stage_out: Option<i32>,
    /// Inter-site jobs
    pub inter_site: Option<i32>,
    /// Setup jobs
    pub setup: Option<i32>,
}

impl Priorities {
    /// Priority configured for `class`
    #[must_use]
    pub fn get(&self, class: JobClass) -> Option<i32> {
        match class {
            JobClass::StageIn => self.stage_in,
            JobClass::StageOut => self.stage_out,
            JobClass::InterSite => self.inter_site,
            JobClass::Setup => self.setup,
        }
    }
}

/// Blocking batch client options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockingBatchOptions {
    /// Transfer service endpoint
    pub endpoint: Option<String>,
    /// Parallel streams per transfer
    pub parallel: Option<u32>,
    /// Concurrent transfers
    pub concurrent: Option<u32>,
    /// TCP buffer size in bytes
    pub tcp_buffer_size: Option<u32>,
}

/// Java batch client manifest options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JavaBatchOptions {
    /// Binary mode instead of ascii
    pub binary: bool,
    /// Block size in bytes
    pub block_size: u32,
    /// TCP buffer size in bytes
    pub tcp_buffer_size: u32,
    /// Parallel streams
    pub streams: u32,
    /// Data channel authentication
    pub dcau: bool,
    /// Concurrency of the request
    pub concurrency: u32,
    /// Subject name of the source server
    pub source_subject: Option<String>,
    /// Subject name of the destination server
    pub destination_subject: Option<String>,
    /// Fail every transfer if one fails
    pub all_or_none: bool,
    /// Maximum retries
    pub retries: u32,
}

impl Default for JavaBatchOptions {
    fn default() -> Self {
        Self {
            binary: true,
            block_size: 16000,
            tcp_buffer_size: 16000,
            streams: 1,
            dcau: true,
            concurrency: 1,
            source_subject: None,
            destination_subject: None,
            all_or_none: false,
            retries: 3,
        }
    }
}

/// Object storage client options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectStoreOptions {
    /// Bucket URL; defaults to `s3://pegasus-<site>`
    pub bucket_url: Option<String>,
    /// Extra client arguments placed before the command
    pub extra_arguments: Option<String>,
}

impl ObjectStoreOptions {
    /// Bucket URL used for jobs owned by `site`
    #[must_use]
    pub fn bucket_for(&self, site: &str) -> String {
        self.bucket_url
            .as_deref()
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("s3://pegasus-{site}"))
    }
}

/// Domain data catalog service coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataCatalogOptions {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
}

impl Default for DataCatalogOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4567,
        }
    }
}

/// Composite dispatcher options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeOptions {
    /// Logical names starting with this prefix are raw datasets
    pub raw_dataset_prefix: String,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            raw_dataset_prefix: "DS".to_string(),
        }
    }
}

/// Transfer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferConfig {
    /// Directory manifests are written into
    pub submit_dir: PathBuf,
    /// Implementation per job class
    pub implementations: ImplementationSelection,
    /// Comma separated sites where permission fix-ups become no-ops
    pub disable_chmod_sites: String,
    /// Wrapper throttling
    pub throttle: Throttle,
    /// Per-class priorities
    pub priorities: Priorities,
    /// Quote URLs for the single-copy client
    pub single_quote: bool,
    /// Path to the local user proxy
    pub proxy: Option<PathBuf>,
    /// Global profile layer, applied last
    pub profiles: Profiles,
    /// Blocking batch client
    pub blocking_batch: BlockingBatchOptions,
    /// Java batch client
    pub java_batch: JavaBatchOptions,
    /// Object storage client
    pub object_store: ObjectStoreOptions,
    /// Data catalog clients
    pub data_catalog: DataCatalogOptions,
    /// Composite dispatcher
    pub composite: CompositeOptions,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            submit_dir: PathBuf::from("."),
            implementations: ImplementationSelection::default(),
            disable_chmod_sites: String::new(),
            throttle: Throttle::default(),
            priorities: Priorities::default(),
            single_quote: true,
            proxy: None,
            profiles: Profiles::default(),
            blocking_batch: BlockingBatchOptions::default(),
            java_batch: JavaBatchOptions::default(),
            object_store: ObjectStoreOptions::default(),
            data_catalog: DataCatalogOptions::default(),
            composite: CompositeOptions::default(),
        }
    }
}

impl TransferConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With submit directory
    #[inline]
    #[must_use]
    pub fn with_submit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.submit_dir = dir.into();
        self
    }

    /// With implementation key for one class
    #[must_use]
    pub fn with_implementation(mut self, class: JobClass, key: &str) -> Self {
        let slot = match class {
            JobClass::StageIn => &mut self.implementations.stage_in,
            JobClass::StageOut => &mut self.implementations.stage_out,
            JobClass::InterSite => &mut self.implementations.inter_site,
            JobClass::Setup => &mut self.implementations.setup,
        };
        *slot = key.to_string();
        self
    }

    /// With the same implementation key for every class
    #[inline]
    #[must_use]
    pub fn with_implementations(mut self, key: &str) -> Self {
        self.implementations = ImplementationSelection::all(key);
        self
    }

    /// With disabled-chmod site list
    #[inline]
    #[must_use]
    pub fn with_disabled_chmod_sites(mut self, sites: impl Into<String>) -> Self {
        self.disable_chmod_sites = sites.into();
        self
    }

    /// With priority for one class
    #[must_use]
    pub fn with_priority(mut self, class: JobClass, priority: i32) -> Self {
        let slot = match class {
            JobClass::StageIn => &mut self.priorities.stage_in,
            JobClass::StageOut => &mut self.priorities.stage_out,
            JobClass::InterSite => &mut self.priorities.inter_site,
            JobClass::Setup => &mut self.priorities.setup,
        };
        *slot = Some(priority);
        self
    }

    /// With local proxy path
    #[inline]
    #[must_use]
    pub fn with_proxy(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxy = Some(path.into());
        self
    }

    /// With global profiles
    #[inline]
    #[must_use]
    pub fn with_profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = profiles;
        self
    }

    /// With blocking batch endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.blocking_batch.endpoint = Some(endpoint.into());
        self
    }

    /// Load from a `.toml`, `.yaml`/`.yml` or `.json` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or has another extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = match ext.as_str() {
            "toml" => toml::from_str(&text).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&text).map_err(|e| e.to_string()),
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns error on an unregistered implementation key, a blocking batch
    /// selection without endpoint, or a zero process or stream count
    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in JobClass::ALL {
            let key = self.implementations.get(class);
            if !ImplementationRegistry::contains(key) {
                return Err(ConfigError::UnknownImplementation {
                    class,
                    key: key.to_string(),
                });
            }
        }
        let uses_blocking_batch = JobClass::ALL
            .iter()
            .any(|c| self.implementations.get(*c) == "blocking-batch");
        if uses_blocking_batch
            && self
                .blocking_batch
                .endpoint
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
        {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.throttle.processes == 0 {
            return Err(ConfigError::ZeroCount("throttle.processes"));
        }
        if self.throttle.streams == 0 {
            return Err(ConfigError::ZeroCount("throttle.streams"));
        }
        Ok(())
    }
}

/// Sites where permission fix-ups are replaced by no-op jobs
///
/// `*` disables fix-ups everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledChmodSites {
    sites: BTreeSet<String>,
    all: bool,
}

impl DisabledChmodSites {
    /// Parse a comma and/or whitespace separated site list
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let sites: BTreeSet<String> = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let all = sites.contains("*");
        Self { sites, all }
    }

    /// Whether fix-ups are disabled for `site`
    #[must_use]
    pub fn contains(&self, site: &str) -> bool {
        self.all || self.sites.contains(site)
    }

    /// Number of listed sites
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
