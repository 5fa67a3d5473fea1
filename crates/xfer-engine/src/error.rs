//! Error types for transfer job construction
//!
//! Every construction failure is fatal: it aborts the job being built and is
//! expected to abort the planning run. Each variant names the job, and where
//! relevant the site, logical file and transformation, so the planner can
//! report exactly what triggered it.

use std::path::PathBuf;
use xfer_model::JobClass;

/// Fatal construction failure
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// No catalog entry and no viable default for a transfer executable
    #[error("no entry for {transformation} on site {site} (job {job}{})", file_note(.lfn))]
    CatalogLookup {
        /// Fully qualified transformation name
        transformation: String,
        /// Site the executable was needed on
        site: String,
        /// Job being built
        job: String,
        /// Logical file that triggered the lookup
        lfn: Option<String>,
    },

    /// A one-file-per-job strategy received some other number of files
    #[error("{strategy} moves exactly one file per job, job {job} was given {count}")]
    InvalidBatchSize {
        /// Offending strategy
        strategy: &'static str,
        /// Job being built
        job: String,
        /// Files received
        count: usize,
    },

    /// A strategy was asked to build a class of job it does not support
    #[error("{strategy} cannot build {class} job {job}")]
    UnsupportedJobClass {
        /// Offending strategy or service
        strategy: &'static str,
        /// Requested class
        class: JobClass,
        /// Job being built
        job: String,
    },

    /// Manifest could not be written
    #[error("failed to write manifest {path} for job {job}: {source}")]
    ManifestWrite {
        /// Target path
        path: PathBuf,
        /// Job being built
        job: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The workflow graph rejected a node or edge
    #[error("workflow graph rejected job {job}: {source}")]
    Graph {
        /// Job being registered
        job: String,
        /// Underlying error
        #[source]
        source: GraphError,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn file_note(lfn: &Option<String>) -> String {
    lfn.as_ref()
        .map(|l| format!(", file {l}"))
        .unwrap_or_default()
}

impl TransferError {
    /// Create a catalog lookup error
    #[must_use]
    pub fn catalog_lookup(
        transformation: impl ToString,
        site: impl Into<String>,
        job: impl Into<String>,
        lfn: Option<&str>,
    ) -> Self {
        Self::CatalogLookup {
            transformation: transformation.to_string(),
            site: site.into(),
            job: job.into(),
            lfn: lfn.map(str::to_string),
        }
    }

    /// Create a graph error for `job`
    #[must_use]
    pub fn graph(job: impl Into<String>, source: GraphError) -> Self {
        Self::Graph {
            job: job.into(),
            source,
        }
    }

    /// Whether the planning run must stop
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Job the error was raised for, if any
    #[must_use]
    pub fn job(&self) -> Option<&str> {
        match self {
            Self::CatalogLookup { job, .. }
            | Self::InvalidBatchSize { job, .. }
            | Self::UnsupportedJobClass { job, .. }
            | Self::ManifestWrite { job, .. }
            | Self::Graph { job, .. } => Some(job),
            Self::Config(_) => None,
        }
    }
}

/// Workflow graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Edge from a job to itself
    #[error("self-loop on {0}")]
    SelfLoop(String),

    /// Edge would close a cycle
    #[error("edge {parent} -> {child} would create a cycle")]
    CycleDetected {
        /// Parent job
        parent: String,
        /// Child job
        child: String,
    },

    /// A job with this name was already added
    #[error("job {0} already exists")]
    DuplicateJob(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File could not be parsed
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// File extension is not toml, yaml, yml or json
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Selected implementation key is not registered
    #[error("unknown transfer implementation {key} for {class} jobs")]
    UnknownImplementation {
        /// Job class the key was selected for
        class: JobClass,
        /// Offending key
        key: String,
    },

    /// Blocking batch client selected without an endpoint
    #[error("blocking-batch implementation requires blocking_batch.endpoint")]
    MissingEndpoint,

    /// A count that must be positive is zero
    #[error("{0} must be greater than zero")]
    ZeroCount(&'static str),
}
