mod common;

use pretty_assertions::assert_eq;
use xfer_catalog::{EntryOrigin, TransformationCatalog};
use xfer_engine::protocols::WRAPPER_SYNTHESIS;
use xfer_engine::{ManifestFormat, TransferConfig};
use xfer_model::{
    AuxiliaryKind, FileTransfer, JobClass, Namespace, TransformationName, WorkflowNode, LOCAL_SITE,
};
use xfer_test_utils::{
    compute_job, executable, scratch_url, stage_in_file, transfer_gateway, Fixture, BARE_PEGASUS_HOME,
    BARE_SITE,
};

fn analyze_inputs() -> Vec<FileTransfer> {
    vec![
        stage_in_file("a.dat", "site1"),
        stage_in_file("b.dat", "site1"),
        executable("run.exe", "site1"),
    ]
}

#[test]
fn wrapper_stage_in_with_executable_gets_xbit_fixup() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, TransferConfig::new());
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);

    let job = engine
        .create_transfer_job(&mut graph, &compute, &analyze_inputs(), "tx_analyze", JobClass::StageIn)
        .unwrap();

    assert_eq!(job.site(), "site1");
    assert_eq!(job.executable(), "/opt/pegasus/bin/transfer");
    assert_eq!(job.arguments(), "-P 4 -p 1");
    assert_eq!(job.stdin(), Some("tx_analyze.in"));
    assert_eq!(job.files().len(), 3);
    assert_eq!(
        job.scheduling().grid_endpoint.as_deref(),
        Some(transfer_gateway("site1").as_str())
    );
    assert_eq!(job.profiles().get(Namespace::Dagman, "category"), Some("stage-in"));

    let manifest = std::fs::read_to_string(fx.submit_dir().join("tx_analyze.in")).unwrap();
    let pairs = ManifestFormat::CommentedBlocks.parse(&manifest).unwrap();
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[2].1, scratch_url("site1", "run.exe"));

    assert_eq!(common::auxiliary_names(&graph, AuxiliaryKind::SetXBit), ["chmod_analyze_0"]);
    assert!(graph.has_edge("tx_analyze", "chmod_analyze_0"));
    assert!(graph.has_edge("chmod_analyze_0", "analyze"));
    assert!(graph.node("tx_analyze").is_some());

    match graph.node("chmod_analyze_0") {
        Some(WorkflowNode::Auxiliary(fixup)) => {
            assert_eq!(fixup.site, "site1");
            assert_eq!(fixup.executable, "/opt/pegasus/bin/dirmanager");
            assert_eq!(fixup.arguments, "-X -f /scratch/run.exe");
        }
        other => panic!("expected execute-bit job, got {other:?}"),
    }
}

#[test]
fn disabled_chmod_site_gets_noop_instead() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, TransferConfig::new().with_disabled_chmod_sites("site1"));
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);

    engine
        .create_transfer_job(&mut graph, &compute, &analyze_inputs(), "tx_analyze", JobClass::StageIn)
        .unwrap();

    assert!(common::auxiliary_names(&graph, AuxiliaryKind::SetXBit).is_empty());
    assert_eq!(common::auxiliary_names(&graph, AuxiliaryKind::NoOp), ["noop_analyze_0"]);
    assert!(graph.has_edge("tx_analyze", "noop_analyze_0"));
    assert!(graph.has_edge("noop_analyze_0", "analyze"));

    match graph.node("noop_analyze_0") {
        Some(WorkflowNode::Auxiliary(noop)) => {
            assert_eq!(noop.site, LOCAL_SITE);
            assert_eq!(noop.executable, "/bin/true");
            assert_eq!(noop.profiles.get(Namespace::Condor, "noop_job"), Some("true"));
        }
        other => panic!("expected no-op job, got {other:?}"),
    }
}

#[test]
fn object_store_stage_out_gets_from_owner_bucket() {
    let fx = Fixture::new();
    let engine = common::engine(
        &fx,
        TransferConfig::new().with_implementation(JobClass::StageOut, "object-store"),
    );
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);
    let out = FileTransfer::new(
        "out.dat",
        ("site1", scratch_url("site1", "out.dat")),
        (LOCAL_SITE, "file:///local/out.dat"),
    );

    let job = engine
        .create_transfer_job(&mut graph, &compute, &[out], "out_analyze", JobClass::StageOut)
        .unwrap();

    assert_eq!(job.arguments(), "get s3://pegasus-site1/out.dat /local/out.dat");
    assert_eq!(job.site(), LOCAL_SITE);
    assert_eq!(job.non_third_party_site(), "site1");
    assert_eq!(job.executable(), "/usr/bin/s3cmd");
}

#[test]
fn missing_wrapper_is_synthesized_once_then_found() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, TransferConfig::new());
    let compute = compute_job("analyze", BARE_SITE);
    let mut graph = common::graph_with(&compute);

    let job = engine
        .create_transfer_job(
            &mut graph,
            &compute,
            &[stage_in_file("a.dat", BARE_SITE)],
            "tx_analyze",
            JobClass::StageIn,
        )
        .unwrap();

    let expected = format!("{BARE_PEGASUS_HOME}/bin/transfer");
    assert_eq!(job.executable(), expected);
    assert_eq!(job.scheduling().grid_endpoint, None);

    let wrapper = TransformationName::namespaced("pegasus", "transfer");
    let stored = fx.catalog_store().lookup(&wrapper, BARE_SITE, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].physical_path, expected);

    let again = engine
        .context()
        .resolver()
        .resolve_or_synthesize(&wrapper, BARE_SITE, Some(&WRAPPER_SYNTHESIS))
        .unwrap();
    assert_eq!(again.origin, EntryOrigin::Catalog);
    assert_eq!(again.entry.physical_path, expected);
}

#[test]
fn unknown_site_without_entry_is_fatal() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, TransferConfig::new().with_implementations("url-copy"));
    let compute = compute_job("analyze", "nowhere");
    let mut graph = common::graph_with(&compute);

    let err = engine
        .create_transfer_job(
            &mut graph,
            &compute,
            &[stage_in_file("a.dat", "nowhere")],
            "tx_analyze",
            JobClass::StageIn,
        )
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(err.job(), Some("tx_analyze"));
    assert!(err.to_string().contains("globus::guc"));
    assert!(!graph.contains("tx_analyze"));
}
