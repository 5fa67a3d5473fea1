//! Jobs
//!
//! Transfer jobs are assembled in a [`JobUnderConstruction`] and sealed into
//! an immutable [`TransferJob`] once resolution, profile layering, argument
//! generation and fix-up injection have all run. Auxiliary jobs and compute
//! jobs are plain records.

use crate::file::FileTransfer;
use crate::job_class::JobClass;
use crate::profiles::Profiles;
use crate::transformation::TransformationName;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Scheduling mode a job runs under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Universe {
    /// Plain local or pool execution
    Vanilla,
    /// Checkpointing execution
    Standard,
    /// Remote grid submission
    Grid,
    /// Transfer-only job
    #[default]
    Transfer,
    /// Runs on the submit host
    Local,
    /// Runs inside the scheduler
    Scheduler,
}

impl Universe {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Universe::Vanilla => "vanilla",
            Universe::Standard => "standard",
            Universe::Grid => "grid",
            Universe::Transfer => "transfer",
            Universe::Local => "local",
            Universe::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Universe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(Universe::Vanilla),
            "standard" => Ok(Universe::Standard),
            "grid" | "globus" => Ok(Universe::Grid),
            "transfer" => Ok(Universe::Transfer),
            "local" => Ok(Universe::Local),
            "scheduler" => Ok(Universe::Scheduler),
            other => Err(format!("unknown universe: {other}")),
        }
    }
}

/// A compute job that needs data moved for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeJob {
    /// Unique job name
    pub name: String,
    /// Execution site
    pub site: String,
}

impl ComputeJob {
    /// Create a compute job
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site: site.into(),
        }
    }
}

/// Scheduler-facing attributes of a transfer job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingAttributes {
    /// Execution universe
    pub universe: Universe,
    /// Scheduler priority; unset means the scheduler default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Extra files shipped with the job, in insertion order
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub transfer_input_files: IndexSet<String>,
    /// Grid gateway contact the job is submitted through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_endpoint: Option<String>,
    /// Ship the executable from the submit host
    #[serde(default)]
    pub transfer_executable: bool,
    /// Site-specific code must not reset the job's working directory
    #[serde(default)]
    pub keep_initial_dir: bool,
}

/// A job absorbed into a merged job, kept for lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    /// Name the job had before merging
    pub name: String,
    /// Class the job had before merging
    pub class: JobClass,
}

/// A transfer job still being assembled
///
/// Every construction step mutates this value directly. Call
/// [`JobUnderConstruction::finalize`] once no further step will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUnderConstruction {
    /// Job name
    pub name: String,
    /// Job class
    pub class: JobClass,
    /// Compute job this transfer serves
    pub compute_job: String,
    /// Site the job runs on
    pub site: String,
    /// Logical owner site used for third-party routing
    pub non_third_party_site: String,
    /// Resolved transformation
    pub transformation: TransformationName,
    /// Physical path of the executable
    pub executable: String,
    /// Argument string
    pub arguments: String,
    /// Inline input payload (manifest basename)
    pub stdin: Option<String>,
    /// Manifest written for this job
    pub manifest: Option<PathBuf>,
    /// Scheduler attributes
    pub scheduling: SchedulingAttributes,
    /// Accumulated profiles
    pub profiles: Profiles,
    /// Files moved by this job
    pub files: Vec<FileTransfer>,
    /// Jobs merged into this one
    pub constituents: Vec<Constituent>,
}

impl JobUnderConstruction {
    /// Start a job that runs, until routed elsewhere, on the owner site
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        class: JobClass,
        compute_job: impl Into<String>,
        non_third_party_site: impl Into<String>,
    ) -> Self {
        let owner = non_third_party_site.into();
        Self {
            name: name.into(),
            class,
            compute_job: compute_job.into(),
            site: owner.clone(),
            non_third_party_site: owner,
            transformation: TransformationName::new(""),
            executable: String::new(),
            arguments: String::new(),
            stdin: None,
            manifest: None,
            scheduling: SchedulingAttributes::default(),
            profiles: Profiles::default(),
            files: Vec::new(),
            constituents: Vec::new(),
        }
    }

    /// Seal the job
    #[must_use]
    pub fn finalize(self) -> TransferJob {
        TransferJob {
            name: self.name,
            class: self.class,
            compute_job: self.compute_job,
            site: self.site,
            non_third_party_site: self.non_third_party_site,
            transformation: self.transformation,
            executable: self.executable,
            arguments: self.arguments,
            stdin: self.stdin,
            manifest: self.manifest,
            scheduling: self.scheduling,
            profiles: self.profiles,
            files: self.files,
            constituents: self.constituents,
        }
    }
}

/// A finished transfer job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferJob {
    name: String,
    class: JobClass,
    compute_job: String,
    site: String,
    non_third_party_site: String,
    transformation: TransformationName,
    executable: String,
    arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<PathBuf>,
    scheduling: SchedulingAttributes,
    profiles: Profiles,
    files: Vec<FileTransfer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constituents: Vec<Constituent>,
}

impl TransferJob {
    /// Job name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Job class
    #[inline]
    #[must_use]
    pub fn class(&self) -> JobClass {
        self.class
    }

    /// Compute job this transfer serves
    #[inline]
    #[must_use]
    pub fn compute_job(&self) -> &str {
        &self.compute_job
    }

    /// Execution site
    #[inline]
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Logical owner site
    #[inline]
    #[must_use]
    pub fn non_third_party_site(&self) -> &str {
        &self.non_third_party_site
    }

    /// Resolved transformation
    #[inline]
    #[must_use]
    pub fn transformation(&self) -> &TransformationName {
        &self.transformation
    }

    /// Physical executable path
    #[inline]
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Argument string
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Inline input payload
    #[inline]
    #[must_use]
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Manifest file, when one was written
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }

    /// Scheduler attributes
    #[inline]
    #[must_use]
    pub fn scheduling(&self) -> &SchedulingAttributes {
        &self.scheduling
    }

    /// Accumulated profiles
    #[inline]
    #[must_use]
    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    /// Files moved by this job
    #[inline]
    #[must_use]
    pub fn files(&self) -> &[FileTransfer] {
        &self.files
    }

    /// Jobs merged into this one
    #[inline]
    #[must_use]
    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    /// Reopen the job for further construction steps
    #[must_use]
    pub fn into_builder(self) -> JobUnderConstruction {
        JobUnderConstruction {
            name: self.name,
            class: self.class,
            compute_job: self.compute_job,
            site: self.site,
            non_third_party_site: self.non_third_party_site,
            transformation: self.transformation,
            executable: self.executable,
            arguments: self.arguments,
            stdin: self.stdin,
            manifest: self.manifest,
            scheduling: self.scheduling,
            profiles: self.profiles,
            files: self.files,
            constituents: self.constituents,
        }
    }
}

/// Kind of auxiliary job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuxiliaryKind {
    /// Sets the execute bit on a staged executable
    SetXBit,
    /// Always-succeeding placeholder
    NoOp,
}

/// Permission fix-up or placeholder job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxiliaryJob {
    /// Job name
    pub name: String,
    /// Kind
    pub kind: AuxiliaryKind,
    /// Compute job the fix-up precedes
    pub compute_job: String,
    /// Execution site
    pub site: String,
    /// Transformation invoked, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<TransformationName>,
    /// Executable path
    pub executable: String,
    /// Argument string
    pub arguments: String,
    /// Execution universe
    pub universe: Universe,
    /// Profiles
    pub profiles: Profiles,
}

/// Any node the engine hands to the workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WorkflowNode {
    /// A compute job
    Compute(ComputeJob),
    /// A transfer job
    Transfer(TransferJob),
    /// A fix-up or placeholder job
    Auxiliary(AuxiliaryJob),
}

impl WorkflowNode {
    /// Node name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            WorkflowNode::Compute(j) => &j.name,
            WorkflowNode::Transfer(j) => j.name(),
            WorkflowNode::Auxiliary(j) => &j.name,
        }
    }

    /// Execution site
    #[must_use]
    pub fn site(&self) -> &str {
        match self {
            WorkflowNode::Compute(j) => &j.site,
            WorkflowNode::Transfer(j) => j.site(),
            WorkflowNode::Auxiliary(j) => &j.site,
        }
    }
}

impl From<ComputeJob> for WorkflowNode {
    fn from(job: ComputeJob) -> Self {
        WorkflowNode::Compute(job)
    }
}

impl From<TransferJob> for WorkflowNode {
    fn from(job: TransferJob) -> Self {
        WorkflowNode::Transfer(job)
    }
}

impl From<AuxiliaryJob> for WorkflowNode {
    fn from(job: AuxiliaryJob) -> Self {
        WorkflowNode::Auxiliary(job)
    }
}
