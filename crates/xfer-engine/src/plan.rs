//! Batch planning
//!
//! Drives the engine over a file of transfer requests the way the workflow
//! refiner would: register each compute job, build its transfer jobs, and
//! wire stage-in style jobs before and stage-out jobs after it.

use crate::engine::TransferEngine;
use crate::error::TransferError;
use crate::graph::{Edge, Refiner, WorkflowGraph};
use serde::{Deserialize, Serialize};
use std::path::Path;
use xfer_catalog::{CatalogError, CatalogSnapshot};
use xfer_model::{ComputeJob, FileTransfer, JobClass, WorkflowNode};

/// Sites a routing rule applies to for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteRule {
    /// Job class
    pub class: JobClass,
    /// Site handles, `*` for all
    pub sites: Vec<String>,
}

/// One transfer need of a compute job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedTransfer {
    /// Job class
    pub class: JobClass,
    /// Files to move
    pub files: Vec<FileTransfer>,
    /// Job name; generated when absent
    #[serde(default)]
    pub name: Option<String>,
}

/// A compute job and its transfer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedJob {
    /// The compute job
    pub compute: ComputeJob,
    /// Its transfers
    #[serde(default)]
    pub transfers: Vec<PlannedTransfer>,
}

/// Input of a planning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanRequest {
    /// Sites and transformation catalog
    pub catalog: CatalogSnapshot,
    /// Third-party transfer sites
    pub third_party: Vec<SiteRule>,
    /// Sites whose third-party transfers run remotely
    pub remote_third_party: Vec<SiteRule>,
    /// Compute jobs
    pub jobs: Vec<PlannedJob>,
}

impl PlanRequest {
    /// Load a request; `.json` files are parsed as JSON, anything else as YAML
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|reason| CatalogError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Empty graph carrying this request's routing rules
    #[must_use]
    pub fn graph(&self) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new();
        for rule in &self.third_party {
            for site in &rule.sites {
                graph = graph.with_third_party_site(rule.class, site);
            }
        }
        for rule in &self.remote_third_party {
            for site in &rule.sites {
                graph = graph.with_remote_tpt_site(rule.class, site);
            }
        }
        graph
    }
}

/// Result of a planning run
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    /// Every job, in insertion order
    pub nodes: Vec<WorkflowNode>,
    /// Every edge
    pub edges: Vec<Edge>,
}

impl From<&WorkflowGraph> for PlanOutput {
    fn from(graph: &WorkflowGraph) -> Self {
        Self {
            nodes: graph.jobs().cloned().collect(),
            edges: graph.edges(),
        }
    }
}

/// Generated name of the `index`-th `class` job of `compute`
#[must_use]
pub fn default_job_name(class: JobClass, compute: &str, index: usize) -> String {
    let prefix = match class {
        JobClass::StageIn => "stage_in_",
        JobClass::StageOut => "stage_out_",
        JobClass::InterSite => "stage_inter_",
        JobClass::Setup => "stage_setup_",
    };
    format!("{prefix}{compute}_{index}")
}

/// Build every transfer in `request` into `graph`
///
/// # Errors
/// Returns the first fatal construction or graph error
pub fn plan_into(
    engine: &TransferEngine,
    request: &PlanRequest,
    graph: &mut WorkflowGraph,
) -> Result<(), TransferError> {
    for planned in &request.jobs {
        let compute = &planned.compute;
        graph
            .add_job(compute.clone().into())
            .map_err(|e| TransferError::graph(&compute.name, e))?;

        let mut counters = [0usize; 4];
        for transfer in &planned.transfers {
            let slot = JobClass::ALL
                .iter()
                .position(|c| *c == transfer.class)
                .unwrap_or_default();
            let name = transfer.name.clone().unwrap_or_else(|| {
                default_job_name(transfer.class, &compute.name, counters[slot])
            });
            counters[slot] += 1;

            let job = engine.create_transfer_job(
                graph,
                compute,
                &transfer.files,
                &name,
                transfer.class,
            )?;
            let (parent, child, parent_is_transfer) = match transfer.class {
                JobClass::StageOut => (compute.name.as_str(), job.name(), false),
                _ => (job.name(), compute.name.as_str(), true),
            };
            graph
                .add_relation(parent, child, &compute.site, parent_is_transfer)
                .map_err(|e| TransferError::graph(job.name(), e))?;
        }
    }
    Ok(())
}

/// Plan `request` on a fresh graph
///
/// # Errors
/// Returns the first fatal construction or graph error
pub fn plan(engine: &TransferEngine, request: &PlanRequest) -> Result<WorkflowGraph, TransferError> {
    let mut graph = request.graph();
    plan_into(engine, request, &mut graph)?;
    Ok(graph)
}
