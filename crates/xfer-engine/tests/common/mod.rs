#![allow(dead_code)]

use xfer_engine::{PlannerContext, TransferConfig, TransferEngine, WorkflowGraph};
use xfer_model::{AuxiliaryKind, ComputeJob, WorkflowNode};
use xfer_test_utils::Fixture;

pub fn context(fx: &Fixture, config: TransferConfig) -> PlannerContext {
    PlannerContext::new(
        config.with_submit_dir(fx.submit_dir()),
        fx.catalog(),
        fx.sites(),
    )
    .unwrap()
}

pub fn engine(fx: &Fixture, config: TransferConfig) -> TransferEngine {
    TransferEngine::new(context(fx, config)).unwrap()
}

/// Graph already holding `compute`
pub fn graph_with(compute: &ComputeJob) -> WorkflowGraph {
    use xfer_engine::Refiner;
    let mut graph = WorkflowGraph::new();
    graph.add_job(compute.clone().into()).unwrap();
    graph
}

/// Names of auxiliary jobs of `kind`, in insertion order
pub fn auxiliary_names(graph: &WorkflowGraph, kind: AuxiliaryKind) -> Vec<String> {
    graph
        .jobs()
        .filter_map(|node| match node {
            WorkflowNode::Auxiliary(aux) if aux.kind == kind => Some(aux.name.clone()),
            _ => None,
        })
        .collect()
}
