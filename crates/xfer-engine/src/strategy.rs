//! Transfer strategy traits
//!
//! A protocol declares its capabilities through [`Protocol`] and one of the
//! two batching traits. The batching templates in [`crate::templates`] turn
//! those into a [`TransferImplementation`], the object-safe interface the
//! engine selects per job class.

use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::graph::Refiner;
use crate::manifest::ManifestFormat;
use std::fmt;
use xfer_catalog::SynthesisPolicy;
use xfer_model::{
    ComputeJob, FileTransfer, JobClass, JobUnderConstruction, TransferJob,
    TransformationCatalogEntry, TransformationName,
};

/// One call to build a transfer job
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// Compute job the transfer serves
    pub compute_job: &'a ComputeJob,
    /// Files to move
    pub files: &'a [FileTransfer],
    /// Subset of `files` that are staged executables
    pub exec_files: &'a [FileTransfer],
    /// Name for the resulting job
    pub job_name: &'a str,
    /// Class of the resulting job
    pub class: JobClass,
}

impl<'a> TransferRequest<'a> {
    /// Request with no staged executables
    #[must_use]
    pub fn new(
        compute_job: &'a ComputeJob,
        files: &'a [FileTransfer],
        job_name: &'a str,
        class: JobClass,
    ) -> Self {
        Self {
            compute_job,
            files,
            exec_files: &[],
            job_name,
            class,
        }
    }

    /// With staged executables
    #[inline]
    #[must_use]
    pub fn with_exec_files(mut self, exec_files: &'a [FileTransfer]) -> Self {
        self.exec_files = exec_files;
        self
    }

    /// Logical name of the first file, for error reports
    #[must_use]
    pub fn first_lfn(&self) -> Option<&'a str> {
        self.files.first().map(FileTransfer::lfn)
    }
}

/// Capabilities shared by every transfer protocol
pub trait Protocol: Send + Sync + fmt::Debug {
    /// Registry key
    fn key(&self) -> &'static str;

    /// Short human-readable description
    fn description(&self) -> &'static str;

    /// Whether staged files keep their execute bit
    fn preserves_execute_bit(&self) -> bool {
        false
    }

    /// Whether every transfer runs in third-party mode
    fn always_third_party(&self) -> bool {
        false
    }

    /// Transformation that performs the transfer
    fn transformation(&self) -> TransformationName;

    /// How to build a default entry on a catalog miss, if at all
    fn synthesis_policy(&self) -> Option<&'static SynthesisPolicy> {
        None
    }

    /// Executable for `site`; `None` is fatal for the caller
    fn resolve_executable(
        &self,
        ctx: &PlannerContext,
        site: &str,
    ) -> Option<TransformationCatalogEntry> {
        ctx.resolver()
            .resolve_or_synthesize(&self.transformation(), site, self.synthesis_policy())
            .map(|r| r.entry)
    }
}

/// A protocol that moves exactly one file per job
pub trait SingleFileProtocol: Protocol {
    /// Arguments for moving `file`
    ///
    /// # Errors
    /// Returns error if the protocol cannot move this class of file
    fn argument_string(
        &self,
        ctx: &PlannerContext,
        job: &mut JobUnderConstruction,
        file: &FileTransfer,
    ) -> Result<String, TransferError>;
}

/// A protocol that moves many files per job through a manifest
pub trait MultiFileProtocol: Protocol {
    /// Manifest line format
    fn manifest_format(&self, ctx: &PlannerContext) -> ManifestFormat;

    /// Arguments, computed after profiles and manifest are in place
    fn argument_string(&self, ctx: &PlannerContext, job: &mut JobUnderConstruction) -> String;

    /// Last protocol-specific adjustment before fix-up injection
    fn post_process(&self, _ctx: &PlannerContext, _job: &mut JobUnderConstruction) {}
}

/// Object-safe job construction entry point
pub trait TransferImplementation: Send + Sync + fmt::Debug {
    /// Registry key
    fn key(&self) -> &'static str;

    /// Short human-readable description
    fn description(&self) -> &'static str;

    /// Whether staged files keep their execute bit
    fn preserves_execute_bit(&self) -> bool;

    /// Whether every transfer runs in third-party mode
    fn always_third_party(&self) -> bool;

    /// Build the transfer job for `request`, registering any fix-up jobs
    /// and edges with `driver`
    ///
    /// # Errors
    /// Returns the first fatal construction error
    fn create_transfer_job(
        &self,
        ctx: &PlannerContext,
        driver: &mut dyn Refiner,
        request: &TransferRequest<'_>,
    ) -> Result<TransferJob, TransferError>;
}
