//! Composite dispatcher
//!
//! Splits one transfer request across the batch wrapper and the data
//! catalog clients, then folds the resulting sub-jobs back into a single
//! job carrying the caller's name.
//!
//! Stage-in files whose logical name starts with the raw-dataset prefix are
//! fetched from the data catalog one job each; the rest are patterns handed
//! to the wrapper as one batch. Stage-out files are all ingested one job
//! each. Other classes are not supported.

use crate::aggregator::{seqexec, JobAggregator};
use crate::base;
use crate::config::TransferConfig;
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::graph::Refiner;
use crate::manifest::absolute_manifest_path;
use crate::protocols::{DataCatalogClient, TransferWrapper};
use crate::strategy::{TransferImplementation, TransferRequest};
use crate::templates::{MultiFileTemplate, SingleFileTemplate};
use tracing::{debug, error, info_span};
use xfer_model::{FileTransfer, JobClass, TransferJob};

/// Routes files to the wrapper or the data catalog clients
#[derive(Debug, Clone)]
pub struct Composite {
    wrapper: MultiFileTemplate<TransferWrapper>,
    retrieve: SingleFileTemplate<DataCatalogClient>,
    ingest: SingleFileTemplate<DataCatalogClient>,
    aggregator: JobAggregator,
    raw_dataset_prefix: String,
}

impl Composite {
    /// Registry key
    pub const KEY: &'static str = "composite";

    /// Dispatcher configured from `config`
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            wrapper: MultiFileTemplate::new(TransferWrapper::new(config)),
            retrieve: SingleFileTemplate::new(DataCatalogClient::retrieve(config)),
            ingest: SingleFileTemplate::new(DataCatalogClient::ingest(config)),
            aggregator: JobAggregator::new(),
            raw_dataset_prefix: config.composite.raw_dataset_prefix.clone(),
        }
    }

    /// Whether `file` names a raw dataset
    #[must_use]
    pub fn is_raw_dataset(&self, file: &FileTransfer) -> bool {
        file.lfn().starts_with(&self.raw_dataset_prefix)
    }

    fn pattern_job(
        &self,
        ctx: &PlannerContext,
        driver: &mut dyn Refiner,
        request: &TransferRequest<'_>,
        patterns: &[FileTransfer],
    ) -> Result<TransferJob, TransferError> {
        let sub = TransferRequest::new(request.compute_job, patterns, request.job_name, request.class);
        let mut job = self.wrapper.create_transfer_job(ctx, driver, &sub)?.into_builder();

        // The manifest becomes a plain argument shipped with the job.
        if let Some(stdin) = job.stdin.take() {
            job.arguments = if job.arguments.is_empty() {
                stdin
            } else {
                format!("{} {stdin}", job.arguments)
            };
        }
        if let Some(path) = &job.manifest {
            job.scheduling
                .transfer_input_files
                .insert(absolute_manifest_path(path).display().to_string());
        }
        Ok(job.finalize())
    }

    fn catalog_jobs(
        &self,
        ctx: &PlannerContext,
        driver: &mut dyn Refiner,
        request: &TransferRequest<'_>,
        client: &SingleFileTemplate<DataCatalogClient>,
        files: &[FileTransfer],
    ) -> Result<Vec<TransferJob>, TransferError> {
        files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let name = format!("{}_dc_{i}", request.job_name);
                let sub = TransferRequest::new(
                    request.compute_job,
                    std::slice::from_ref(file),
                    &name,
                    request.class,
                );
                client.create_transfer_job(ctx, driver, &sub)
            })
            .collect()
    }
}

impl TransferImplementation for Composite {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "routes patterns to the batch wrapper and raw datasets to the data catalog"
    }

    fn preserves_execute_bit(&self) -> bool {
        false
    }

    fn always_third_party(&self) -> bool {
        false
    }

    fn create_transfer_job(
        &self,
        ctx: &PlannerContext,
        driver: &mut dyn Refiner,
        request: &TransferRequest<'_>,
    ) -> Result<TransferJob, TransferError> {
        let _span = info_span!(
            "transfer_job",
            job = request.job_name,
            class = %request.class,
            strategy = Self::KEY
        )
        .entered();

        let mut sub_jobs = match request.class {
            JobClass::StageIn => {
                let (raw, patterns): (Vec<FileTransfer>, Vec<FileTransfer>) = request
                    .files
                    .iter()
                    .cloned()
                    .partition(|f| self.is_raw_dataset(f));
                debug!(raw = raw.len(), patterns = patterns.len(), "partitioned stage-in files");
                let mut jobs = Vec::with_capacity(raw.len() + 1);
                if !patterns.is_empty() {
                    jobs.push(self.pattern_job(ctx, driver, request, &patterns)?);
                }
                jobs.extend(self.catalog_jobs(ctx, driver, request, &self.retrieve, &raw)?);
                jobs
            }
            JobClass::StageOut => {
                self.catalog_jobs(ctx, driver, request, &self.ingest, request.files)?
            }
            class => {
                error!(job = request.job_name, %class, "composite only builds stage-in and stage-out jobs");
                return Err(TransferError::UnsupportedJobClass {
                    strategy: Self::KEY,
                    class,
                    job: request.job_name.to_string(),
                });
            }
        };

        let mut job = if sub_jobs.len() > 1 {
            self.aggregator
                .merge(ctx, &sub_jobs, &seqexec(), request.job_name, request.class)?
                .into_builder()
        } else if let Some(only) = sub_jobs.pop() {
            only.into_builder()
        } else {
            error!(job = request.job_name, "composite request without files");
            return Err(TransferError::InvalidBatchSize {
                strategy: Self::KEY,
                job: request.job_name.to_string(),
                count: 0,
            });
        };

        job.name = request.job_name.to_string();
        job.class = request.class;
        base::apply_proxy_staging(ctx, &mut job);
        base::apply_priority(ctx, &mut job);

        if request.class == JobClass::StageIn && !request.exec_files.is_empty() {
            base::inject_permission_fixups(
                ctx,
                driver,
                request.compute_job,
                request.job_name,
                request.class,
                request.exec_files,
            )?;
        }
        Ok(job.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WorkflowGraph;
    use crate::testing;
    use xfer_model::FileKind;
    use xfer_test_utils::{compute_job, stage_in_file, stage_out_file, Fixture};

    #[test]
    fn single_dataset_is_renamed_not_merged() {
        let fx = Fixture::new();
        let config = TransferConfig::new();
        let ctx = testing::context(&fx, config.clone());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let files = [stage_in_file("DS1", "site1")];
        let req = TransferRequest::new(&compute, &files, "tx_analyze", JobClass::StageIn);

        let job = Composite::new(&config)
            .create_transfer_job(&ctx, &mut g, &req)
            .unwrap();
        assert_eq!(job.name(), "tx_analyze");
        assert_eq!(job.executable(), "/opt/dc/bin/dc-client");
        assert!(job.constituents().is_empty());
        assert!(!fx.submit_dir().join("merge_tx_analyze.in").exists());
    }

    #[test]
    fn inter_site_is_unsupported() {
        let fx = Fixture::new();
        let config = TransferConfig::new();
        let ctx = testing::context(&fx, config.clone());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let files = [stage_out_file("o.dat", "site1")];
        let req = TransferRequest::new(&compute, &files, "tx", JobClass::InterSite);
        assert!(matches!(
            Composite::new(&config).create_transfer_job(&ctx, &mut g, &req),
            Err(TransferError::UnsupportedJobClass { strategy: "composite", .. })
        ));
    }

    #[test]
    fn stage_out_executables_are_ingested_without_fixups() {
        let fx = Fixture::new();
        let config = TransferConfig::new();
        let ctx = testing::context(&fx, config.clone());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let files = [stage_out_file("built.exe", "site1").with_kind(FileKind::Executable)];
        let req = TransferRequest::new(&compute, &files, "out_analyze", JobClass::StageOut)
            .with_exec_files(&files);

        let job = Composite::new(&config)
            .create_transfer_job(&ctx, &mut g, &req)
            .unwrap();
        assert_eq!(job.class(), JobClass::StageOut);
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn empty_request_is_rejected() {
        let fx = Fixture::new();
        let config = TransferConfig::new();
        let ctx = testing::context(&fx, config.clone());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let req = TransferRequest::new(&compute, &[], "tx", JobClass::StageOut);
        assert!(matches!(
            Composite::new(&config).create_transfer_job(&ctx, &mut g, &req),
            Err(TransferError::InvalidBatchSize { count: 0, .. })
        ));
    }
}
