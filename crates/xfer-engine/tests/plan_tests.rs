mod common;

use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use xfer_engine::plan::{plan, PlanOutput, PlanRequest};
use xfer_engine::{PlannerContext, TransferConfig, TransferEngine};
use xfer_model::{JobClass, WorkflowNode, LOCAL_SITE};
use xfer_test_utils::Fixture;

const REQUEST: &str = r"
third_party:
  - class: stage-out
    sites: [site1]
jobs:
  - compute: { name: analyze, site: site1 }
    transfers:
      - class: stage-in
        files:
          - lfn: a.dat
            sources: [{ site: local, url: 'file:///inputs/a.dat' }]
            destinations: [{ site: site1, url: 'gsiftp://site1.example.org/scratch/a.dat' }]
          - lfn: run.exe
            kind: executable
            sources: [{ site: local, url: 'file:///inputs/run.exe' }]
            destinations: [{ site: site1, url: 'gsiftp://site1.example.org/scratch/run.exe' }]
      - class: stage-out
        name: out_analyze
        files:
          - lfn: out.dat
            sources: [{ site: site1, url: 'gsiftp://site1.example.org/scratch/out.dat' }]
            destinations: [{ site: local, url: 'file:///outputs/out.dat' }]
";

fn write_file(dir: &std::path::Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

#[test]
fn request_file_plans_into_ordered_graph() {
    let fx = Fixture::new();
    let path = write_file(fx.submit_dir(), "request.yaml", REQUEST);
    let request = PlanRequest::load(&path).unwrap();
    let engine = common::engine(&fx, TransferConfig::new());

    let graph = plan(&engine, &request).unwrap();

    assert!(graph.has_edge("stage_in_analyze_0", "analyze"));
    assert!(graph.has_edge("stage_in_analyze_0", "chmod_analyze_0"));
    assert!(graph.has_edge("chmod_analyze_0", "analyze"));
    assert!(graph.has_edge("analyze", "out_analyze"));
    assert_eq!(graph.node("out_analyze").map(WorkflowNode::site), Some(LOCAL_SITE));
    assert_eq!(graph.node("stage_in_analyze_0").map(WorkflowNode::site), Some("site1"));

    let order = graph.topological_order();
    assert_eq!(order.first(), Some(&"stage_in_analyze_0"));
    assert_eq!(order.last(), Some(&"out_analyze"));

    let output = serde_json::to_value(PlanOutput::from(&graph)).unwrap();
    assert_eq!(output["nodes"].as_array().map(Vec::len), Some(4));
    assert_eq!(output["nodes"][0]["type"], "compute");
    assert_eq!(output["edges"].as_array().map(Vec::len), Some(4));
}

#[test]
fn catalog_and_config_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let request = format!(
        "{REQUEST}
catalog:
  sites:
    - handle: site1
      profiles: {{ env: {{ PEGASUS_HOME: /opt/pegasus, LD_LIBRARY_PATH: /opt/globus/lib }} }}
    - handle: local
      profiles: {{ env: {{ PEGASUS_HOME: /opt/pegasus, LD_LIBRARY_PATH: /opt/globus/lib }} }}
  transformations:
    - name: {{ namespace: pegasus, name: dirmanager }}
      site: site1
      physical_path: /opt/pegasus/bin/dirmanager
"
    );
    let request = PlanRequest::load(&write_file(dir.path(), "request.yml", &request)).unwrap();
    let config_path = write_file(
        dir.path(),
        "xfer.toml",
        &format!(
            "submit_dir = {:?}\n\n[priorities]\nstage_in = 20\n",
            dir.path().display().to_string()
        ),
    );
    let config = TransferConfig::load(&config_path).unwrap();

    let (catalog, sites) = request.catalog.clone().into_stores();
    let ctx = PlannerContext::new(config, Arc::new(catalog), Arc::new(sites)).unwrap();
    let engine = TransferEngine::new(ctx).unwrap();
    let graph = plan(&engine, &request).unwrap();

    // The wrapper is synthesized from each site's environment.
    match graph.node("stage_in_analyze_0") {
        Some(WorkflowNode::Transfer(job)) => {
            assert_eq!(job.executable(), "/opt/pegasus/bin/transfer");
            assert_eq!(job.scheduling().priority.as_deref(), Some("20"));
            assert_eq!(job.class(), JobClass::StageIn);
        }
        other => panic!("expected transfer job, got {other:?}"),
    }
    assert!(dir.path().join("stage_in_analyze_0.in").exists());
    assert!(dir.path().join("out_analyze.in").exists());
}

#[test]
fn unknown_request_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "request.json", r#"{"jobs": [], "extra": 1}"#);
    assert!(PlanRequest::load(&path).is_err());
}
