//! Transfer engine facade

use crate::context::PlannerContext;
use crate::error::{ConfigError, TransferError};
use crate::graph::Refiner;
use crate::registry::Implementations;
use crate::strategy::{TransferImplementation, TransferRequest};
use tracing::info;
use xfer_model::{ComputeJob, FileTransfer, JobClass, TransferJob};

/// Builds transfer jobs with the implementation configured per job class
#[derive(Debug)]
pub struct TransferEngine {
    ctx: PlannerContext,
    implementations: Implementations,
}

impl TransferEngine {
    /// Select implementations for `ctx`'s configuration
    ///
    /// # Errors
    /// Returns error if an implementation cannot be constructed
    pub fn new(ctx: PlannerContext) -> Result<Self, ConfigError> {
        let implementations = Implementations::from_config(ctx.config())?;
        Ok(Self {
            ctx,
            implementations,
        })
    }

    /// Planner context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &PlannerContext {
        &self.ctx
    }

    /// Implementation used for `class`
    #[must_use]
    pub fn implementation(&self, class: JobClass) -> &dyn TransferImplementation {
        self.implementations.get(class)
    }

    /// Build the `class` job moving `files` for `compute_job` and register it
    /// with `driver`.
    ///
    /// On stage-in, files tagged as executables are handed to fix-up
    /// injection. Other classes move executables like any other file.
    ///
    /// # Errors
    /// Returns the first fatal construction error
    pub fn create_transfer_job(
        &self,
        driver: &mut dyn Refiner,
        compute_job: &ComputeJob,
        files: &[FileTransfer],
        job_name: &str,
        class: JobClass,
    ) -> Result<TransferJob, TransferError> {
        let exec_files: Vec<FileTransfer> = if class == JobClass::StageIn {
            files.iter().filter(|f| f.is_executable()).cloned().collect()
        } else {
            Vec::new()
        };
        let request =
            TransferRequest::new(compute_job, files, job_name, class).with_exec_files(&exec_files);

        let implementation = self.implementations.get(class);
        let job = implementation.create_transfer_job(&self.ctx, driver, &request)?;
        driver
            .add_job(job.clone().into())
            .map_err(|e| TransferError::graph(job.name(), e))?;

        info!(
            job = job.name(),
            class = %class,
            site = job.site(),
            strategy = implementation.key(),
            files = files.len(),
            "created transfer job"
        );
        Ok(job)
    }
}
