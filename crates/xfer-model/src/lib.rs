//! # XFER Model
//!
//! Shared data model for transfer job construction.
//!
//! ## Core Types
//!
//! - [`JobClass`]: stage-in, stage-out, inter-site or setup
//! - [`FileTransfer`]: one logical file with its source and destination URLs
//! - [`TransformationName`] / [`TransformationCatalogEntry`]: executables that perform transfers
//! - [`Profiles`]: namespaced key/value settings layered onto jobs
//! - [`JobUnderConstruction`]: mutable builder, finalized into an immutable [`TransferJob`]
//! - [`AuxiliaryJob`]: permission fix-up and no-op nodes
//!
//! ## Example
//!
//! ```rust
//! use xfer_model::{FileTransfer, JobClass, JobUnderConstruction};
//!
//! let file = FileTransfer::new("a.dat", ("local", "file:///data/a.dat"), ("site1", "gsiftp://site1/scratch/a.dat"));
//! let mut job = JobUnderConstruction::new("tx_analyze", JobClass::StageIn, "analyze", "site1");
//! job.files.push(file);
//! let job = job.finalize();
//! assert_eq!(job.name(), "tx_analyze");
//! assert_eq!(job.class(), JobClass::StageIn);
//! ```

pub mod file;
pub mod job;
pub mod job_class;
pub mod profiles;
pub mod transformation;

pub use file::{absolute_path, FileKind, FileTransfer, IncompleteFileTransfer, SiteUrl};
pub use job::{
    AuxiliaryJob, AuxiliaryKind, ComputeJob, Constituent, JobUnderConstruction,
    SchedulingAttributes, TransferJob, Universe, WorkflowNode,
};
pub use job_class::{JobClass, ParseJobClassError};
pub use profiles::{keys, Namespace, Profiles};
pub use transformation::{
    SysInfo, TransformationCatalogEntry, TransformationName, TransformationType,
};

/// The site name of the submit host.
pub const LOCAL_SITE: &str = "local";
