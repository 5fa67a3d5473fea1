//! Job aggregation
//!
//! Collapses several transfer jobs into one job that runs their command
//! lines one after another. The command lines go into
//! `merge_<mergedName>.in`, which the sequential executor reads on stdin.

use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::manifest::MANIFEST_SUFFIX;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{error, info};
use xfer_model::{
    Constituent, FileTransfer, JobClass, JobUnderConstruction, TransferJob, TransformationName,
};

/// Name prefix of aggregator input files
pub const MERGE_PREFIX: &str = "merge_";

/// Sequential executor used to run merged jobs
#[must_use]
pub fn seqexec() -> TransformationName {
    TransformationName::namespaced("pegasus", "seqexec")
}

/// Merges transfer jobs into one sequential job
#[derive(Debug, Clone, Copy, Default)]
pub struct JobAggregator;

impl JobAggregator {
    /// Create an aggregator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge `jobs`, in order, into one job named `merged_name` of class
    /// `class`, executed by `executor` on the first job's site.
    ///
    /// Side files, profiles and moved files of every job are carried over.
    /// The jobs' own names and classes are kept as constituents.
    ///
    /// # Errors
    /// Returns [`TransferError::InvalidBatchSize`] for an empty list,
    /// [`TransferError::CatalogLookup`] if `executor` is not installed on the
    /// site, or [`TransferError::ManifestWrite`] if the input file cannot be
    /// written
    pub fn merge(
        &self,
        ctx: &PlannerContext,
        jobs: &[TransferJob],
        executor: &TransformationName,
        merged_name: &str,
        class: JobClass,
    ) -> Result<TransferJob, TransferError> {
        let Some(first) = jobs.first() else {
            return Err(TransferError::InvalidBatchSize {
                strategy: "aggregator",
                job: merged_name.to_string(),
                count: 0,
            });
        };

        let Some(entry) = ctx.resolver().resolve(executor, first.site()) else {
            error!(
                job = merged_name,
                site = first.site(),
                transformation = %executor,
                "no sequential executor"
            );
            return Err(TransferError::catalog_lookup(
                executor,
                first.site(),
                merged_name,
                first.files().first().map(FileTransfer::lfn),
            ));
        };

        let input_name = format!("{MERGE_PREFIX}{merged_name}{MANIFEST_SUFFIX}");
        let path = ctx.submit_dir().join(&input_name);
        let written = File::create(&path).and_then(|file| {
            let mut w = BufWriter::new(file);
            for job in jobs {
                if job.arguments().is_empty() {
                    writeln!(w, "{}", job.executable())?;
                } else {
                    writeln!(w, "{} {}", job.executable(), job.arguments())?;
                }
            }
            w.flush()
        });
        if let Err(source) = written {
            error!(job = merged_name, path = %path.display(), error = %source, "unable to write aggregator input");
            return Err(TransferError::ManifestWrite {
                path,
                job: merged_name.to_string(),
                source,
            });
        }

        let mut merged = JobUnderConstruction::new(
            merged_name,
            class,
            first.compute_job(),
            first.non_third_party_site(),
        );
        merged.site = first.site().to_string();
        merged.transformation = entry.name.clone();
        merged.executable = entry.physical_path.clone();
        merged.stdin = Some(input_name);
        merged.manifest = Some(path);
        merged.scheduling.universe = first.scheduling().universe;
        merged.scheduling.grid_endpoint = first.scheduling().grid_endpoint.clone();
        merged.profiles.merge(&entry.profiles);

        for job in jobs {
            let scheduling = job.scheduling();
            merged
                .scheduling
                .transfer_input_files
                .extend(scheduling.transfer_input_files.iter().cloned());
            merged.scheduling.keep_initial_dir |= scheduling.keep_initial_dir;
            merged.profiles.merge(job.profiles());
            merged.files.extend(job.files().iter().cloned());
            merged.constituents.push(Constituent {
                name: job.name().to_string(),
                class: job.class(),
            });
        }

        info!(
            job = merged_name,
            constituents = ?merged.constituents.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "merged transfer jobs"
        );
        Ok(merged.finalize())
    }
}
